use crate::request::{Provider, ProvisioningRequest};
use std::collections::BTreeMap;
use std::fmt;

/// Variables applied to every toolchain run so it never waits for input.
const AUTOMATION_VARS: [(&str, &str); 2] = [("TF_IN_AUTOMATION", "1"), ("TF_INPUT", "0")];

/// Host credentials that must never reach a request's subprocess.
const HOST_IDENTITY_VARS: [&str; 11] = [
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "AWS_PROFILE",
    "ARM_CLIENT_ID",
    "ARM_CLIENT_SECRET",
    "ARM_TENANT_ID",
    "ARM_SUBSCRIPTION_ID",
    "GOOGLE_CREDENTIALS",
    "GOOGLE_APPLICATION_CREDENTIALS",
    "GOOGLE_PROJECT",
];

/// Exact environment handed to one subprocess.
///
/// Built fresh per request; the process environment is never mutated, so
/// concurrent requests cannot observe each other's credentials.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ExecutionEnvironment {
    vars: BTreeMap<String, String>,
}

impl ExecutionEnvironment {
    /// Snapshot of the current process environment. Non UTF-8 entries are skipped.
    pub fn ambient() -> Vec<(String, String)> {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Base variables minus host credentials, plus the request's credential variables.
    ///
    /// Credential variables are always set from the request, empty or not.
    pub fn build<I, K, V>(base: I, provider: Provider, request: &ProvisioningRequest) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut env = Self::from_vars(base);
        for name in HOST_IDENTITY_VARS {
            env.vars.remove(name);
        }
        for (name, value) in AUTOMATION_VARS {
            env.set(name, value);
        }
        for (name, value) in credential_vars(provider, request) {
            env.set(name, value);
        }
        env
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn credential_vars(provider: Provider, request: &ProvisioningRequest) -> Vec<(&'static str, &str)> {
    match provider {
        Provider::Aws => vec![
            ("AWS_ACCESS_KEY_ID", request.aws_access_key.as_str()),
            ("AWS_SECRET_ACCESS_KEY", request.aws_secret_key.as_str()),
        ],
        Provider::Azure => vec![
            ("ARM_CLIENT_ID", request.azure_client_id.as_str()),
            ("ARM_CLIENT_SECRET", request.azure_client_secret.as_str()),
            ("ARM_TENANT_ID", request.azure_tenant_id.as_str()),
            ("ARM_SUBSCRIPTION_ID", request.azure_subscription_id.as_str()),
        ],
        Provider::Gcp => vec![
            ("GOOGLE_CREDENTIALS", request.gcp_key_json.as_str()),
            ("GOOGLE_PROJECT", request.gcp_project.as_str()),
        ],
    }
}

impl fmt::Debug for ExecutionEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionEnvironment")
            .field("names", &self.vars.keys().collect::<Vec<_>>())
            .finish()
    }
}
