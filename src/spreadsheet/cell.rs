use std::fmt::Display;

/// A raw cell as delivered by a workbook reader.
///
/// Formatting, formulas and merged ranges are not modelled; a cell is only ever
/// blank, text, a number or a boolean.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Blank,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// True for absent cells and for text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Blank => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, CellValue::Bool(_))
    }

    /// Numeric reading of the cell.
    ///
    /// Text only counts when the whole trimmed string is a finite number, so `"8"` and
    /// `" 7.5 "` parse while `"8/10"` does not. Booleans never parse.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) if value.is_finite() => Some(*value),
            CellValue::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite()),
            _ => None,
        }
    }

    /// Text payload, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Blank => Ok(()),
            CellValue::Text(text) => write!(f, "{}", text),
            CellValue::Number(value) => write!(f, "{}", value),
            CellValue::Bool(value) => write!(f, "{}", value),
        }
    }
}
