/// The logged-in operator as resolved from the saved session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Operator {
    pub login: String,
    pub nome: String,
    pub cnp: String,
    pub adm: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any logged-in operator.
    Operator,
    /// Operators flagged `adm`.
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("login required")]
    NotLoggedIn,
    #[error("operator {0} is not an administrator")]
    NotAdmin(String),
}

/// Gates an operation on the current session.
pub fn authorize(operator: Option<&Operator>, access: Access) -> Result<&Operator, AccessDenied> {
    let operator = operator
        .filter(|op| !op.login.trim().is_empty())
        .ok_or(AccessDenied::NotLoggedIn)?;
    match access {
        Access::Operator => Ok(operator),
        Access::Admin if operator.adm => Ok(operator),
        Access::Admin => Err(AccessDenied::NotAdmin(operator.login.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operator(adm: bool) -> Operator {
        Operator {
            login: "operador1".into(),
            nome: "Operador".into(),
            cnp: "12345678000199".into(),
            adm,
        }
    }

    #[test]
    fn missing_session_is_denied() {
        assert_eq!(authorize(None, Access::Operator), Err(AccessDenied::NotLoggedIn));
    }

    #[test]
    fn blank_login_counts_as_missing() {
        let blank = Operator::default();
        assert_eq!(authorize(Some(&blank), Access::Operator), Err(AccessDenied::NotLoggedIn));
    }

    #[test]
    fn admin_gate_requires_flag() {
        let plain = operator(false);
        let admin = operator(true);
        assert!(authorize(Some(&plain), Access::Operator).is_ok());
        assert_eq!(
            authorize(Some(&plain), Access::Admin),
            Err(AccessDenied::NotAdmin("operador1".into()))
        );
        assert_eq!(authorize(Some(&admin), Access::Admin), Ok(&admin));
    }
}
