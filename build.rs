use semver::Version;
use std::env;

fn main() {
    // gdal-sys publishes the linked GDAL version through its `links = "gdal"` metadata.
    let gdal_version_string = env::var("DEP_GDAL_VERSION_NUMBER")
        .expect("gdal-sys did not report the GDAL version number");
    let gdal_version = gdal_version_string
        .parse::<u64>()
        .expect("Could not convert gdal version string into number.");

    let major = gdal_version / 1_000_000;
    let minor = (gdal_version - major * 1_000_000) / 10_000;
    let patch = (gdal_version - major * 1_000_000 - minor * 10_000) / 100;
    let detected_version = Version::new(major, minor, patch);

    if detected_version.major < 2 {
        panic!("gdal-facade requires GDAL >= 2.0, found {detected_version}");
    }

    println!("cargo:rerun-if-env-changed=DEP_GDAL_VERSION_NUMBER");
    println!("cargo:rustc-cfg=major_is_{}", detected_version.major);

    for major in 2..=detected_version.major {
        println!("cargo:rustc-cfg=major_ge_{major}");
    }

    for minor in 0..=detected_version.minor {
        println!("cargo:rustc-cfg=minor_ge_{minor}");
    }
}
