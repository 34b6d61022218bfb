//! Inherited-vs-custom gate.
//!
//! Layout nodes and states come back from the server as one polymorphic
//! record with an inheritance tag. Each node kind is managed by two sibling
//! resources, one per variant; every write on a variant resource first runs
//! through this gate so a declaration can never silently cross the boundary.
//! The server would accept such a write, which is exactly the problem.

use azdoapi::Error;
use azdoapi::models::process::CustomizationType;

/// Reject unless the node is inherited from the parent process.
pub fn require_inherited(resource: impl Into<String>, inherited: bool) -> Result<(), Error> {
    if inherited {
        Ok(())
    } else {
        Err(Error::WrongVariant {
            resource: resource.into(),
            expected: "inherited",
            actual: "custom",
        })
    }
}

/// Reject unless the node was introduced in this process.
pub fn require_custom(resource: impl Into<String>, inherited: bool) -> Result<(), Error> {
    if inherited {
        Err(Error::WrongVariant {
            resource: resource.into(),
            expected: "custom",
            actual: "inherited",
        })
    } else {
        Ok(())
    }
}

/// Gate for states, whose tag is a customization type rather than a flag.
/// Anything other than `Custom` counts as inherited.
pub fn require_inherited_state(
    resource: impl Into<String>,
    customization: Option<CustomizationType>,
) -> Result<(), Error> {
    require_inherited(
        resource,
        !matches!(customization, Some(CustomizationType::Custom)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inherited_gate_rejects_custom_nodes() {
        assert!(require_inherited("page page-1", true).is_ok());
        let err = require_inherited("page page-1", false).unwrap_err();
        assert!(matches!(err, Error::WrongVariant { expected: "inherited", .. }));
        assert_eq!(
            err.to_string(),
            "page page-1 is custom; this resource manages the inherited variant"
        );
    }

    #[test]
    fn custom_gate_rejects_inherited_nodes() {
        assert!(require_custom("group g1", false).is_ok());
        let err = require_custom("group g1", true).unwrap_err();
        assert!(matches!(err, Error::WrongVariant { expected: "custom", .. }));
    }

    #[test]
    fn state_gate_treats_non_custom_as_inherited() {
        assert!(require_inherited_state("state New", Some(CustomizationType::System)).is_ok());
        assert!(require_inherited_state("state New", Some(CustomizationType::Inherited)).is_ok());
        assert!(require_inherited_state("state New", None).is_ok());
        assert!(require_inherited_state("state Triage", Some(CustomizationType::Custom)).is_err());
    }
}
