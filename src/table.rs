//! CSV decoding into a header and string rows

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("input has no header row")]
    MissingHeader,
    #[error("{0}")]
    Csv(#[from] csv::Error),
}

/// Parsed CSV. Every row has exactly `header.len()` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Comma delimited, double-quote quoting, `""` as an escaped quote.
    /// Ragged records are an error rather than being passed on.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(text.as_bytes());
        let header = reader
            .headers()?
            .iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        if header.is_empty() {
            return Err(ParseError::MissingHeader);
        }
        let rows = reader
            .records()
            .map(|record| record.map(|record| record.iter().map(str::to_owned).collect()))
            .collect::<Result<Vec<Vec<String>>, _>>()?;
        Ok(Self { header, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
