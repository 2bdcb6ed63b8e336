use std::fmt::{Display, Formatter};

use crate::cpl::CStringArray;
use crate::errors::{GdalError, Result};
use crate::raster_type::DataType;

/// Ordered command-line style options for GDAL's utility programs.
///
/// Each entry is a switch name (as the utility spells it, e.g. `"-of"`)
/// followed by zero or more values. Entries are flattened into the `argv`
/// array in insertion order, the name first and then each value as its own
/// argument:
///
/// ```
/// use gdal_facade::programs::OptionSet;
///
/// let mut options = OptionSet::new();
/// options
///     .set("-of", "GTiff")
///     .set_values("-tr", ["30", "30"])
///     .flag("-overwrite")
///     .push("-co", "COMPRESS=LZW")
///     .push("-co", "TILED=YES");
///
/// assert_eq!(
///     options.to_args(),
///     ["-of", "GTiff", "-tr", "30", "30", "-overwrite", "-co", "COMPRESS=LZW", "-co", "TILED=YES"]
/// );
/// ```
///
/// When built from _name_/_value_ pairs (`FromIterator`, `From<&[(&str, &str); N]>`)
/// an empty value makes the entry a flag, so such a pair cannot carry an
/// empty-string argument. Use [`OptionSet::set`] for that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSet {
    entries: Vec<(String, Vec<String>)>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to a single value, replacing any previous entry of that
    /// name in place.
    pub fn set(&mut self, name: &str, value: &str) -> &mut Self {
        self.set_values(name, [value])
    }

    /// Set `name` to several values (e.g. `-te xmin ymin xmax ymax`),
    /// replacing any previous entry of that name in place.
    pub fn set_values<S: Into<String>, I: IntoIterator<Item = S>>(
        &mut self,
        name: &str,
        values: I,
    ) -> &mut Self {
        let values = values.into_iter().map(Into::into).collect();
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = values,
            None => self.entries.push((name.to_string(), values)),
        }
        self
    }

    /// Set a switch that takes no value, e.g. `-overwrite`.
    pub fn flag(&mut self, name: &str) -> &mut Self {
        self.set_values(name, Vec::<String>::new())
    }

    /// Append an entry without replacing earlier ones of the same name, for
    /// switches that may repeat (`-co`, `-b`, `-wo`).
    pub fn push(&mut self, name: &str, value: &str) -> &mut Self {
        self.entries.push((name.to_string(), vec![value.to_string()]));
        self
    }

    /// Remove every entry named `name`.
    pub fn remove(&mut self, name: &str) -> &mut Self {
        self.entries.retain(|(n, _)| n != name);
        self
    }

    /// Values of the first entry named `name`.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// Output format driver short name (`-of`).
    pub fn with_output_format(&mut self, driver: &str) -> &mut Self {
        self.set("-of", driver)
    }

    /// Output pixel type (`-ot`).
    pub fn with_output_type(&mut self, data_type: DataType) -> &mut Self {
        self.set("-ot", data_type.name())
    }

    /// Driver-specific creation option (`-co KEY=VALUE`), may repeat.
    pub fn with_creation_option(&mut self, key: &str, value: &str) -> &mut Self {
        self.push("-co", &format!("{key}={value}"))
    }

    /// The flattened argument list, in insertion order.
    pub fn to_args(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|(n, v)| std::iter::once(n.clone()).chain(v.iter().cloned()))
            .collect()
    }

    /// Flatten into a null-terminated `argv` whose strings stay pinned for as
    /// long as the returned array lives.
    pub fn to_c_args(&self) -> Result<CStringArray> {
        if let Some((name, _)) = self.entries.iter().find(|(n, _)| n.trim().is_empty()) {
            return Err(GdalError::InvalidArgument(format!(
                "option name must not be blank, got '{name}'"
            )));
        }
        CStringArray::new(self.to_args())
    }
}

impl Display for OptionSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_args().join(" "))
    }
}

/// An empty option set, so `()` can be passed where defaults are wanted.
impl From<()> for OptionSet {
    fn from(_: ()) -> Self {
        OptionSet::default()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for OptionSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut options = OptionSet::new();
        for (k, v) in iter {
            if v.as_ref().is_empty() {
                options.flag(k.as_ref());
            } else {
                options.set(k.as_ref(), v.as_ref());
            }
        }
        options
    }
}

/// Creates an [`OptionSet`] from _name_/_value_ pairs; an empty value makes
/// a flag.
impl<const N: usize> From<&[(&str, &str); N]> for OptionSet {
    fn from(pairs: &[(&str, &str); N]) -> Self {
        pairs.iter().copied().collect()
    }
}
