use std::fmt::{Display, Formatter};
use std::str::FromStr;

use gdal_sys::GDALDataType;

use crate::errors::GdalError;

/// Pixel data types accepted by dataset creation and by the `-ot` switch of
/// translate and warp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Byte,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl DataType {
    pub fn gdal_ordinal(self) -> GDALDataType::Type {
        match self {
            DataType::Byte => GDALDataType::GDT_Byte,
            DataType::UInt16 => GDALDataType::GDT_UInt16,
            DataType::Int16 => GDALDataType::GDT_Int16,
            DataType::UInt32 => GDALDataType::GDT_UInt32,
            DataType::Int32 => GDALDataType::GDT_Int32,
            DataType::Float32 => GDALDataType::GDT_Float32,
            DataType::Float64 => GDALDataType::GDT_Float64,
        }
    }

    /// The name GDAL's utilities use on the command line.
    pub fn name(self) -> &'static str {
        match self {
            DataType::Byte => "Byte",
            DataType::UInt16 => "UInt16",
            DataType::Int16 => "Int16",
            DataType::UInt32 => "UInt32",
            DataType::Int32 => "Int32",
            DataType::Float32 => "Float32",
            DataType::Float64 => "Float64",
        }
    }

    /// Size of one pixel in bytes.
    pub fn size_bytes(self) -> usize {
        match self {
            DataType::Byte => 1,
            DataType::UInt16 | DataType::Int16 => 2,
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => 4,
            DataType::Float64 => 8,
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = GdalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dt = match s.to_ascii_lowercase().as_str() {
            "byte" | "uint8" => DataType::Byte,
            "uint16" => DataType::UInt16,
            "int16" => DataType::Int16,
            "uint32" => DataType::UInt32,
            "int32" => DataType::Int32,
            "float32" => DataType::Float32,
            "float64" => DataType::Float64,
            _ => {
                return Err(GdalError::InvalidArgument(format!(
                    "unknown data type '{s}'"
                )))
            }
        };
        Ok(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_gdal() {
        for dt in [
            DataType::Byte,
            DataType::UInt16,
            DataType::Int16,
            DataType::UInt32,
            DataType::Int32,
            DataType::Float32,
            DataType::Float64,
        ] {
            let gdal_name = crate::utils::_string(unsafe {
                gdal_sys::GDALGetDataTypeName(dt.gdal_ordinal())
            });
            assert_eq!(gdal_name, dt.name());
            assert_eq!(dt.name().parse::<DataType>().unwrap(), dt);
            let bits = unsafe { gdal_sys::GDALGetDataTypeSizeBits(dt.gdal_ordinal()) };
            assert_eq!(bits as usize, dt.size_bytes() * 8);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("float32".parse::<DataType>().unwrap(), DataType::Float32);
        assert_eq!("UINT8".parse::<DataType>().unwrap(), DataType::Byte);
        assert!(matches!(
            "Complex".parse::<DataType>(),
            Err(GdalError::InvalidArgument(_))
        ));
    }
}
