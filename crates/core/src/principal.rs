/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Stable user identifier (the token subject).
    pub id: String,
    /// How the caller was identified (`"jwt"`, `"header"` or `"body"`).
    pub auth_method: String,
}

impl Principal {
    pub fn new(id: impl Into<String>, auth_method: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            auth_method: auth_method.into(),
        }
    }

    /// Whether this principal owns a resource belonging to `owner_id`.
    pub fn owns(&self, owner_id: &str) -> bool {
        self.id == owner_id
    }
}
