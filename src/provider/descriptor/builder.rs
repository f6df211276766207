// self
use crate::{
	_prelude::*,
	provider::{ClientAuthMethod, ProviderDescriptor, ProviderEndpoints},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderDescriptorError {
	/// Authorization endpoint is required to start the flow.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Token endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Reject scope delimiters that are control characters.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Authorization endpoint.
	pub authorization_endpoint: Option<Url>,
	/// Token endpoint.
	pub token_endpoint: Option<Url>,
	/// Client authentication method for the token endpoint.
	pub client_auth_method: ClientAuthMethod,
	/// Scope delimiter.
	pub scope_delimiter: char,
}
impl ProviderDescriptorBuilder {
	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Overrides the client authentication method.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Overrides the scope delimiter (space by default).
	pub fn scope_delimiter(mut self, delimiter: char) -> Self {
		self.scope_delimiter = delimiter;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let authorization = self
			.authorization_endpoint
			.ok_or(ProviderDescriptorError::MissingAuthorizationEndpoint)?;
		let token = self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let descriptor = ProviderDescriptor {
			endpoints: ProviderEndpoints { authorization, token },
			client_auth_method: self.client_auth_method,
			scope_delimiter: self.scope_delimiter,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}
impl Default for ProviderDescriptorBuilder {
	fn default() -> Self {
		Self {
			authorization_endpoint: None,
			token_endpoint: None,
			client_auth_method: ClientAuthMethod::default(),
			scope_delimiter: ' ',
		}
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	///
	/// Deserialized descriptors bypass the builder, so hosts loading one from configuration should
	/// call this before use; [`TokenManager::new`](crate::lifecycle::TokenManager::new) does.
	pub fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;

		if self.scope_delimiter.is_control() {
			return Err(ProviderDescriptorError::InvalidScopeDelimiter {
				delimiter: self.scope_delimiter,
			});
		}

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	if url.scheme() == "https" || (url.scheme() == "http" && is_loopback(url)) {
		Ok(())
	} else {
		Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse descriptor fixture URL.")
	}

	#[test]
	fn rejects_missing_and_insecure_endpoints() {
		let err = ProviderDescriptor::builder()
			.token_endpoint(url("https://identity.example.com/connect/token"))
			.build()
			.expect_err("Missing authorization endpoint should fail.");

		assert_eq!(err, ProviderDescriptorError::MissingAuthorizationEndpoint);

		let err = ProviderDescriptor::builder()
			.authorization_endpoint(url("https://login.example.com/authorize"))
			.token_endpoint(url("http://identity.example.com/connect/token"))
			.build()
			.expect_err("Plain HTTP token endpoint should fail.");

		assert!(matches!(err, ProviderDescriptorError::InsecureEndpoint { endpoint: "token", .. }));
	}

	#[test]
	fn loopback_http_is_allowed() {
		let descriptor = ProviderDescriptor::builder()
			.authorization_endpoint(url("http://localhost:8080/authorize"))
			.token_endpoint(url("http://127.0.0.1:8080/token"))
			.client_auth_method(ClientAuthMethod::ClientSecretBasic)
			.build()
			.expect("Loopback endpoints should be accepted.");

		assert_eq!(descriptor.client_auth_method, ClientAuthMethod::ClientSecretBasic);
		assert_eq!(descriptor.scope_delimiter, ' ');
	}

	#[test]
	fn control_delimiter_is_rejected() {
		let err = ProviderDescriptor::builder()
			.authorization_endpoint(url("https://login.example.com/authorize"))
			.token_endpoint(url("https://identity.example.com/connect/token"))
			.scope_delimiter('\n')
			.build()
			.expect_err("Control delimiters should fail.");

		assert_eq!(err, ProviderDescriptorError::InvalidScopeDelimiter { delimiter: '\n' });
	}

	#[test]
	fn deserialized_descriptor_uses_defaults() {
		let descriptor: ProviderDescriptor = serde_json::from_str(
			r#"{"endpoints":{"authorization":"https://login.example.com/authorize","token":"https://identity.example.com/connect/token"}}"#,
		)
		.expect("Descriptor JSON should deserialize.");

		assert_eq!(descriptor.client_auth_method, ClientAuthMethod::ClientSecretPost);
		assert_eq!(descriptor.scope_delimiter, ' ');
		assert!(descriptor.validate().is_ok());
	}
}
