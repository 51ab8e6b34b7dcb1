use serde::{Deserialize, Serialize};
use std::fmt;

/// Database-independent classification of a declared type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StandardType {
    SmallInt,
    Int,
    BigInt,
    Decimal,
    Float,
    Double,
    Boolean,
    Char,
    Varchar,
    Text,
    Date,
    Time,
    Timestamp,
    Blob,
    Uuid,
    Unknown,
}

impl StandardType {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "smallint" | "int2" | "tinyint" => StandardType::SmallInt,
            "int" | "integer" | "int4" | "mediumint" | "serial" => StandardType::Int,
            "bigint" | "int8" | "bigserial" => StandardType::BigInt,
            "decimal" | "numeric" | "number" | "money" => StandardType::Decimal,
            "float" | "real" | "float4" => StandardType::Float,
            "double" | "double precision" | "float8" => StandardType::Double,
            "boolean" | "bool" | "bit" => StandardType::Boolean,
            "char" | "character" | "nchar" | "bpchar" => StandardType::Char,
            "varchar" | "character varying" | "nvarchar" | "varchar2" => StandardType::Varchar,
            "text" | "clob" | "longtext" | "mediumtext" | "nclob" => StandardType::Text,
            "date" => StandardType::Date,
            "time" | "timetz" => StandardType::Time,
            "timestamp" | "datetime" | "timestamptz" | "smalldatetime" => StandardType::Timestamp,
            "blob" | "bytea" | "binary" | "varbinary" | "longblob" => StandardType::Blob,
            "uuid" | "uniqueidentifier" => StandardType::Uuid,
            _ => StandardType::Unknown,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            StandardType::SmallInt
                | StandardType::Int
                | StandardType::BigInt
                | StandardType::Decimal
                | StandardType::Float
                | StandardType::Double
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            StandardType::SmallInt | StandardType::Int | StandardType::BigInt
        )
    }

    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            StandardType::Char | StandardType::Varchar | StandardType::Text | StandardType::Uuid
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            StandardType::Date | StandardType::Time | StandardType::Timestamp
        )
    }
}

/// A declared column type: name plus optional parameters, e.g. `VARCHAR(255)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
}

impl DataType {
    pub fn new(name: impl Into<String>) -> Self {
        DataType {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameters<I, S>(name: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DataType {
            name: name.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a textual type such as `decimal(10, 2)`.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        match (text.find('('), text.rfind(')')) {
            (Some(open), Some(close)) if close > open => {
                let params = text[open + 1..close]
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string);
                DataType::with_parameters(text[..open].trim(), params)
            }
            _ => DataType::new(text),
        }
    }

    pub fn standard_type(&self) -> StandardType {
        StandardType::from_name(&self.name)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name.to_uppercase())?;
        if !self.parameters.is_empty() {
            write!(f, "({})", self.parameters.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_parameters() {
        let dt = DataType::parse("decimal( 10 , 2 )");
        assert_eq!(dt.name, "decimal");
        assert_eq!(dt.parameters, vec!["10", "2"]);
        assert_eq!(dt.to_string(), "DECIMAL(10, 2)");
        assert_eq!(dt.standard_type(), StandardType::Decimal);
    }

    #[test]
    fn classifies_vendor_names() {
        assert_eq!(StandardType::from_name("int4"), StandardType::Int);
        assert_eq!(StandardType::from_name("character varying"), StandardType::Varchar);
        assert!(StandardType::from_name("bigserial").is_integer());
        assert_eq!(StandardType::from_name("geometry"), StandardType::Unknown);
    }
}
