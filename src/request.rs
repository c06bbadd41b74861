use crate::error::ProvisionError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cloud providers the gateway knows how to describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Aws,
    Azure,
    Gcp,
}

/// How far a provider is wired through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wiring {
    /// Render, then run the toolchain.
    Toolchain,
    /// Declared but not implemented; answered with a fixed message.
    Placeholder(&'static str),
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Aws, Provider::Azure, Provider::Gcp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Azure => "azure",
            Provider::Gcp => "gcp",
        }
    }

    pub fn wiring(&self) -> Wiring {
        match self {
            Provider::Aws => Wiring::Toolchain,
            Provider::Azure => Wiring::Placeholder("Azure platform is not implemented yet."),
            Provider::Gcp => Wiring::Placeholder("GCP platform is not implemented yet."),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aws" => Ok(Provider::Aws),
            "azure" => Ok(Provider::Azure),
            "gcp" => Ok(Provider::Gcp),
            other => Err(ProvisionError::UnknownProvider(other.to_string())),
        }
    }
}

/// Flat provisioning payload as posted by the form.
///
/// Only the field group of the selected platform is meaningful; the rest
/// are decoded and ignored. Serialization feeds the template context, so
/// every field name here is addressable from a template.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningRequest {
    #[serde(alias = "provider")]
    pub platform: String,

    // AWS
    #[serde(alias = "accessKey")]
    pub aws_access_key: String,
    #[serde(alias = "secretKey")]
    pub aws_secret_key: String,
    #[serde(alias = "instanceName")]
    pub aws_instance_name: String,
    #[serde(alias = "region")]
    pub aws_region: String,
    #[serde(alias = "instanceType")]
    pub aws_instance_type: String,
    #[serde(deserialize_with = "form_flag")]
    pub aws_enable_monitoring: bool,
    #[serde(deserialize_with = "form_flag")]
    pub aws_install_web_server: bool,

    // Azure
    pub azure_client_id: String,
    pub azure_client_secret: String,
    pub azure_tenant_id: String,
    pub azure_subscription_id: String,
    pub azure_location: String,
    pub azure_vm_size: String,
    pub azure_vm_name: String,
    #[serde(deserialize_with = "form_flag")]
    pub azure_install_web_server: bool,

    // GCP
    pub gcp_key_json: String,
    pub gcp_project: String,
    pub gcp_machine_type: String,
    pub gcp_zone: String,
    pub gcp_instance_name: String,
    #[serde(deserialize_with = "form_flag")]
    pub gcp_install_web_server: bool,
}

impl ProvisioningRequest {
    /// Decode a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, ProvisionError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ProvisionError::BadRequest("empty body".to_string()));
        }
        let request: Self = serde_json::from_slice(body)
            .map_err(|e| ProvisionError::BadRequest(e.to_string()))?;
        if request.platform.is_empty() {
            return Err(ProvisionError::BadRequest(
                "missing field `platform`".to_string(),
            ));
        }
        Ok(request)
    }

    pub fn provider(&self) -> Result<Provider, ProvisionError> {
        self.platform.parse()
    }

    /// Check the fields a wired provider cannot do without.
    pub fn validate(&self, provider: Provider) -> Result<(), ProvisionError> {
        let required: Vec<(&str, &str)> = match provider {
            Provider::Aws => vec![
                ("aws_region", self.aws_region.as_str()),
                ("aws_instance_type", self.aws_instance_type.as_str()),
            ],
            Provider::Azure => vec![
                ("azure_location", self.azure_location.as_str()),
                ("azure_vm_size", self.azure_vm_size.as_str()),
            ],
            Provider::Gcp => vec![
                ("gcp_project", self.gcp_project.as_str()),
                ("gcp_machine_type", self.gcp_machine_type.as_str()),
            ],
        };

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ProvisionError::BadRequest(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )))
        }
    }

    /// Every string filled and every flag on; used to check templates at startup.
    pub(crate) fn sample(flags: bool) -> Self {
        let filler = |name: &str| format!("sample-{name}");
        Self {
            platform: "sample".into(),
            aws_access_key: filler("access"),
            aws_secret_key: filler("secret"),
            aws_instance_name: filler("instance"),
            aws_region: filler("region"),
            aws_instance_type: filler("type"),
            aws_enable_monitoring: flags,
            aws_install_web_server: flags,
            azure_client_id: filler("client"),
            azure_client_secret: filler("secret"),
            azure_tenant_id: filler("tenant"),
            azure_subscription_id: filler("subscription"),
            azure_location: filler("location"),
            azure_vm_size: filler("size"),
            azure_vm_name: filler("vm"),
            azure_install_web_server: flags,
            gcp_key_json: filler("key"),
            gcp_project: filler("project"),
            gcp_machine_type: filler("machine"),
            gcp_zone: filler("zone"),
            gcp_instance_name: filler("instance"),
            gcp_install_web_server: flags,
        }
    }
}

impl fmt::Debug for ProvisioningRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const REDACTED: &str = "<redacted>";
        f.debug_struct("ProvisioningRequest")
            .field("platform", &self.platform)
            .field("aws_access_key", &REDACTED)
            .field("aws_secret_key", &REDACTED)
            .field("aws_instance_name", &self.aws_instance_name)
            .field("aws_region", &self.aws_region)
            .field("aws_instance_type", &self.aws_instance_type)
            .field("aws_enable_monitoring", &self.aws_enable_monitoring)
            .field("aws_install_web_server", &self.aws_install_web_server)
            .field("azure_client_id", &REDACTED)
            .field("azure_client_secret", &REDACTED)
            .field("azure_tenant_id", &REDACTED)
            .field("azure_subscription_id", &REDACTED)
            .field("azure_location", &self.azure_location)
            .field("azure_vm_size", &self.azure_vm_size)
            .field("azure_vm_name", &self.azure_vm_name)
            .field("azure_install_web_server", &self.azure_install_web_server)
            .field("gcp_key_json", &REDACTED)
            .field("gcp_project", &self.gcp_project)
            .field("gcp_machine_type", &self.gcp_machine_type)
            .field("gcp_zone", &self.gcp_zone)
            .field("gcp_instance_name", &self.gcp_instance_name)
            .field("gcp_install_web_server", &self.gcp_install_web_server)
            .finish()
    }
}

/// Accept both JSON booleans and HTML checkbox values ("on").
fn form_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
        Null(()),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "on" | "true" | "1" | "yes"
        ),
        Flag::Null(()) => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_snake_case_payload() {
        let body = br#"{
            "platform": "aws",
            "aws_region": "us-east-1",
            "aws_instance_type": "t2.micro",
            "aws_access_key": "AKIA",
            "aws_secret_key": "SECRET"
        }"#;
        let req = ProvisioningRequest::from_slice(body).unwrap();
        assert_eq!(req.provider().unwrap(), Provider::Aws);
        assert_eq!(req.aws_region, "us-east-1");
        assert!(!req.aws_install_web_server);
        assert!(req.azure_location.is_empty());
    }

    #[test]
    fn test_decode_camel_case_aliases() {
        let body = br#"{"provider":"aws","instanceType":"t2.micro","region":"us-east-1","accessKey":"AK1","secretKey":"SK1"}"#;
        let req = ProvisioningRequest::from_slice(body).unwrap();
        assert_eq!(req.platform, "aws");
        assert_eq!(req.aws_instance_type, "t2.micro");
        assert_eq!(req.aws_access_key, "AK1");
        assert_eq!(req.aws_secret_key, "SK1");
    }

    #[test]
    fn test_form_flags() {
        let body = br#"{"platform":"aws","aws_install_web_server":"on","aws_enable_monitoring":false}"#;
        let req = ProvisioningRequest::from_slice(body).unwrap();
        assert!(req.aws_install_web_server);
        assert!(!req.aws_enable_monitoring);

        let body = br#"{"platform":"aws","aws_install_web_server":"off","aws_enable_monitoring":true}"#;
        let req = ProvisioningRequest::from_slice(body).unwrap();
        assert!(!req.aws_install_web_server);
        assert!(req.aws_enable_monitoring);
    }

    #[test]
    fn test_malformed_bodies() {
        let bodies: [&[u8]; 6] = [b"", b"   ", b"{not json", b"[1,2]", b"{}", br#"{"platform":7}"#];
        for body in bodies {
            let err = ProvisioningRequest::from_slice(body).unwrap_err();
            assert!(
                matches!(err, ProvisionError::BadRequest(_)),
                "expected bad request for {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_unknown_provider() {
        let req = ProvisioningRequest::from_slice(br#"{"platform":"oracle"}"#).unwrap();
        match req.provider() {
            Err(ProvisionError::UnknownProvider(name)) => assert_eq!(name, "oracle"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_wiring() {
        assert_eq!(Provider::Aws.wiring(), Wiring::Toolchain);
        assert_eq!(
            Provider::Azure.wiring(),
            Wiring::Placeholder("Azure platform is not implemented yet.")
        );
        assert!(matches!(Provider::Gcp.wiring(), Wiring::Placeholder(_)));
    }

    #[test]
    fn test_validate_reports_missing_fields() {
        let req = ProvisioningRequest {
            platform: "aws".into(),
            aws_region: "eu-west-1".into(),
            ..Default::default()
        };
        let err = req.validate(Provider::Aws).unwrap_err();
        assert!(err.to_string().contains("aws_instance_type"));
        assert!(!err.to_string().contains("aws_region"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let req = ProvisioningRequest {
            platform: "aws".into(),
            aws_access_key: "AKIAVISIBLE".into(),
            aws_secret_key: "topsecret".into(),
            gcp_key_json: "{\"private_key\":\"pk\"}".into(),
            ..Default::default()
        };
        let debug = format!("{req:?}");
        assert!(!debug.contains("AKIAVISIBLE"));
        assert!(!debug.contains("topsecret"));
        assert!(!debug.contains("private_key"));
        assert!(debug.contains("<redacted>"));
    }
}
