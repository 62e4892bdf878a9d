/// Configuration for the Postgres record store.
pub struct PostgresRecordConfig {
    /// Postgres connection URL.
    pub url: String,
    /// Table name prefix (e.g. "medverify_").
    pub prefix: String,
}

impl PostgresRecordConfig {
    /// Create a new configuration with the given URL and the default prefix.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            prefix: "medverify_".to_owned(),
        }
    }

    /// Set the table prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Fully qualified name of the analyses table.
    pub fn table(&self) -> String {
        format!("{}analyses", self.prefix)
    }
}
