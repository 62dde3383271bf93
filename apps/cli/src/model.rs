use osprofiles::NamedProfile;
use osprofiles::store::profile_model;

/// What the CLI stores per profile.
#[profile_model(crate = "::osprofiles::store")]
#[derive(Clone, Default, PartialEq)]
pub struct ConnectionProfile {
    pub name: String,
    pub endpoint: String,
    #[security(secure)]
    pub api_key: String,
    /// Only lives for one invocation.
    #[security(temporary)]
    pub session_token: Option<String>,
}

impl NamedProfile for ConnectionProfile {
    fn profile_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osprofiles::store::{Classified, SecurityLevel, generate_security_report};

    #[test]
    fn test_classification() {
        assert_eq!(ConnectionProfile::level_of("api_key"), Some(SecurityLevel::Secure));
        assert_eq!(ConnectionProfile::level_of("endpoint"), Some(SecurityLevel::Plaintext));
        assert_eq!(ConnectionProfile::level_of("session_token"), Some(SecurityLevel::Temporary));
        assert!(generate_security_report::<ConnectionProfile>().is_clean());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let profile = ConnectionProfile { api_key: "sk-live-1".to_owned(), ..Default::default() };
        assert!(!format!("{profile:?}").contains("sk-live-1"));
    }
}
