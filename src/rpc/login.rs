use serde::Serialize;

/// Fields of both login forms. The password field arrives as `password` on
/// one form and `Password` on the other.
#[derive(FromForm, Default, Debug)]
pub struct LoginForm {
    #[field(name = uncased("username"))]
    pub username: Option<String>,
    #[field(name = uncased("password"))]
    pub password: Option<String>,
}

impl LoginForm {
    /// Both fields, or `None` when either one is missing or empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let username = self.username.as_deref().filter(|v| !v.is_empty())?;
        let password = self.password.as_deref().filter(|v| !v.is_empty())?;
        Some((username, password))
    }
}

#[derive(Serialize, Debug)]
pub struct LoginView {
    pub action: &'static str,
}

#[derive(FromForm, Default, Debug)]
pub struct TitleFilterForm {
    #[field(name = "fTitle")]
    pub f_title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::LoginForm;

    fn form(username: Option<&str>, password: Option<&str>) -> LoginForm {
        LoginForm {
            username: username.map(Into::into),
            password: password.map(Into::into),
        }
    }

    #[test]
    fn test_credentials_need_both_fields() {
        assert_eq!(form(Some("alice"), Some("secret")).credentials(), Some(("alice", "secret")));
        assert_eq!(form(Some("alice"), None).credentials(), None);
        assert_eq!(form(None, Some("secret")).credentials(), None);
        assert_eq!(form(Some(""), Some("secret")).credentials(), None);
        assert_eq!(form(None, None).credentials(), None);
    }
}
