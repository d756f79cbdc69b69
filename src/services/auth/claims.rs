use serde::Serialize;

/// Claim type URIs emitted for client certificates.
pub mod claim_types {
    pub const DNS: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/dns";
    pub const EMAIL: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress";
    pub const ISSUER: &str = "issuer";
    pub const NAME: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name";
    pub const NAME_IDENTIFIER: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";
    pub const SERIAL_NUMBER: &str =
        "http://schemas.microsoft.com/ws/2008/06/identity/claims/serialnumber";
    pub const THUMBPRINT: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/thumbprint";
    pub const UPN: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/upn";
    pub const URI: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/uri";
    pub const X500_DISTINGUISHED_NAME: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/x500distinguishedname";
}

pub mod value_types {
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const BASE64_BINARY: &str = "http://www.w3.org/2001/XMLSchema#base64Binary";
}

/// A typed assertion about the caller, tagged with who asserted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityClaim {
    #[serde(rename = "type")]
    pub claim_type: String,
    /// Empty when the certificate does not carry the attribute.
    pub value: String,
    pub value_type: String,
    pub issuer: String,
    pub original_issuer: String,
}

impl IdentityClaim {
    pub fn new(
        claim_type: impl Into<String>,
        value: impl Into<String>,
        issuer: impl Into<String>,
        original_issuer: impl Into<String>,
    ) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
            value_type: value_types::STRING.to_string(),
            issuer: issuer.into(),
            original_issuer: original_issuer.into(),
        }
    }

    pub fn with_value_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = value_type.into();
        self
    }
}

/// Claims produced by one successful authentication, in mapping order.
///
/// Claim types are not unique; several claims may share a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub scheme: String,
    pub claims: Vec<IdentityClaim>,
}

impl Identity {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            claims: Vec::new(),
        }
    }

    pub fn push(&mut self, claim: IdentityClaim) {
        self.claims.push(claim);
    }

    pub fn find_first(&self, claim_type: &str) -> Option<&IdentityClaim> {
        self.claims.iter().find(|c| c.claim_type == claim_type)
    }

    pub fn claims_of<'a>(&'a self, claim_type: &'a str) -> impl Iterator<Item = &'a IdentityClaim> {
        self.claims.iter().filter(move |c| c.claim_type == claim_type)
    }

    /// Value of the first non-empty name claim.
    pub fn name(&self) -> Option<&str> {
        self.claims_of(claim_types::NAME)
            .map(|c| c.value.as_str())
            .find(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_types_are_kept_in_order() {
        let mut identity = Identity::new("Certificate");
        identity.push(IdentityClaim::new(claim_types::DNS, "a.example", "Certificate", "CN=CA"));
        identity.push(IdentityClaim::new(claim_types::DNS, "b.example", "Certificate", "CN=CA"));

        let values: Vec<_> = identity
            .claims_of(claim_types::DNS)
            .map(|c| c.value.as_str())
            .collect();
        assert_eq!(values, vec!["a.example", "b.example"]);
        assert_eq!(identity.find_first(claim_types::DNS).unwrap().value, "a.example");
    }

    #[test]
    fn name_skips_empty_values() {
        let mut identity = Identity::new("Certificate");
        identity.push(IdentityClaim::new(claim_types::NAME, "", "Certificate", "CN=CA"));
        assert_eq!(identity.name(), None);

        identity.push(IdentityClaim::new(claim_types::NAME, "alice", "Certificate", "CN=CA"));
        assert_eq!(identity.name(), Some("alice"));
    }

    #[test]
    fn serializes_claim_type_as_type() {
        let claim = IdentityClaim::new("issuer", "CN=CA", "Certificate", "CN=CA");
        let json = serde_json::to_value(&claim).unwrap();
        assert_eq!(json["type"], "issuer");
        assert_eq!(json["value_type"], value_types::STRING);
    }
}
