//! Value sets the generator samples from.

/// The finite sets every generated field is drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSets {
    /// Partition routing keys; never part of the event itself.
    pub keys: Vec<String>,
    pub users: Vec<String>,
    pub vehicles: Vec<String>,
    pub colors: Vec<String>,
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for ValueSets {
    fn default() -> Self {
        Self {
            keys: owned(&["Key-1", "Key-2", "Key-3", "Key-4"]),
            users: owned(&["John", "Mike", "Dwight", "Pam", "Kevin"]),
            vehicles: owned(&["Kia", "Ford", "BMW"]),
            colors: owned(&["Red", "Black", "White", "Blue", "Green", "Gray"]),
        }
    }
}

impl ValueSets {
    /// Name of the first empty set, if any.
    pub fn first_empty(&self) -> Option<&'static str> {
        [
            ("keys", &self.keys),
            ("users", &self.users),
            ("vehicles", &self.vehicles),
            ("colors", &self.colors),
        ]
        .into_iter()
        .find(|(_, values)| values.is_empty())
        .map(|(name, _)| name)
    }
}
