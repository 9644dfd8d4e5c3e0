//! Per-call bookkeeping.

use warden_transport::{ApiRequest, RequestId};

use crate::Credential;

/// One logical call travelling through the pipeline.
///
/// Built fresh for every call and owned by that call alone, so concurrent
/// calls can never see or flip each other's retry flag. The wrapped
/// request is never modified; each attempt sends a copy with the credential
/// of that moment attached.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    id: RequestId,
    request: ApiRequest,
    retried: bool,
}

impl RequestDescriptor {
    /// Wraps a request with a new ID and a clear retry flag.
    pub fn new(request: ApiRequest) -> Self {
        Self {
            id: RequestId::next(),
            request,
            retried: false,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    /// The request as the caller submitted it.
    pub fn request(&self) -> &ApiRequest {
        &self.request
    }

    /// Returns `true` once the call has been through renewal.
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    /// Sets the retry flag.
    ///
    /// Returns `true` the first time and `false` on every later call: a
    /// `false` means this call already had its one renewal.
    pub fn mark_retried(&mut self) -> bool {
        if self.retried {
            return false;
        }
        self.retried = true;
        true
    }

    /// Builds the request for one attempt, with `credential` attached.
    pub fn attempt(&self, credential: Option<&Credential>) -> ApiRequest {
        let mut request = self.request.clone();
        if let Some(credential) = credential {
            let (name, value) = credential.header();
            request.set_header(name, value);
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_retried_only_first_call_succeeds() {
        let mut descriptor = RequestDescriptor::new(ApiRequest::get("/leases"));
        assert!(!descriptor.is_retried());

        assert!(descriptor.mark_retried());
        assert!(descriptor.is_retried());
        assert!(!descriptor.mark_retried());
        assert!(descriptor.is_retried());
    }

    #[test]
    fn test_attempt_attaches_credential_without_touching_original() {
        let descriptor = RequestDescriptor::new(ApiRequest::get("/leases"));
        let credential = Credential::Bearer("fresh".into());

        let attempt = descriptor.attempt(Some(&credential));

        assert_eq!(attempt.header("authorization"), Some("Bearer fresh"));
        assert_eq!(descriptor.request().header("authorization"), None);
    }

    #[test]
    fn test_attempt_replaces_caller_supplied_authorization() {
        let request =
            ApiRequest::get("/leases").with_header("Authorization", "Bearer old");
        let descriptor = RequestDescriptor::new(request);

        let attempt =
            descriptor.attempt(Some(&Credential::Bearer("new".into())));

        assert_eq!(attempt.headers.len(), 1);
        assert_eq!(attempt.header("Authorization"), Some("Bearer new"));
    }

    #[test]
    fn test_attempt_without_credential_sends_request_as_is() {
        let descriptor = RequestDescriptor::new(ApiRequest::get("/leases"));
        assert_eq!(descriptor.attempt(None), *descriptor.request());
    }

    #[test]
    fn test_new_descriptors_get_distinct_ids() {
        let a = RequestDescriptor::new(ApiRequest::get("/a"));
        let b = RequestDescriptor::new(ApiRequest::get("/b"));
        assert_ne!(a.id(), b.id());
    }
}
