use secrecy::SecretString;

/// Which SMS backend delivers one-time codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmsProvider {
    /// Log the destination instead of sending. Local dev only.
    Log,
    Twilio,
}

/// Secrets and provider settings resolved at startup. A missing secret is a
/// startup failure, never a per-request one.
#[derive(Clone, Debug)]
pub struct GlobalArgs {
    pub field_key: SecretString,
    pub transport_key: SecretString,
    pub token_secret: SecretString,
    pub token_ttl_seconds: i64,
    pub sms_provider: SmsProvider,
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<SecretString>,
    pub twilio_from: Option<String>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(
        field_key: SecretString,
        transport_key: SecretString,
        token_secret: SecretString,
    ) -> Self {
        Self {
            field_key,
            transport_key,
            token_secret,
            token_ttl_seconds: 3600,
            sms_provider: SmsProvider::Log,
            twilio_account_sid: None,
            twilio_auth_token: None,
            twilio_from: None,
        }
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_sms_provider(mut self, provider: SmsProvider) -> Self {
        self.sms_provider = provider;
        self
    }

    #[must_use]
    pub fn with_twilio(
        mut self,
        account_sid: String,
        auth_token: SecretString,
        from: String,
    ) -> Self {
        self.twilio_account_sid = Some(account_sid);
        self.twilio_auth_token = Some(auth_token);
        self.twilio_from = Some(from);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(secret("aa"), secret("bb"), secret("cc"));

        assert_eq!(args.field_key.expose_secret(), "aa");
        assert_eq!(args.token_secret.expose_secret(), "cc");
        assert_eq!(args.token_ttl_seconds, 3600);
        assert_eq!(args.sms_provider, SmsProvider::Log);
        assert!(args.twilio_account_sid.is_none());
    }

    #[test]
    fn test_builders() {
        let args = GlobalArgs::new(secret("aa"), secret("bb"), secret("cc"))
            .with_token_ttl_seconds(600)
            .with_sms_provider(SmsProvider::Twilio)
            .with_twilio("AC123".to_string(), secret("tok"), "+15005550006".to_string());

        assert_eq!(args.token_ttl_seconds, 600);
        assert_eq!(args.sms_provider, SmsProvider::Twilio);
        assert_eq!(args.twilio_account_sid.as_deref(), Some("AC123"));
        assert_eq!(args.twilio_from.as_deref(), Some("+15005550006"));
    }
}
