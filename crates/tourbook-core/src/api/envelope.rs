use serde::Deserialize;

use super::ApiError;

/// Response wrapper used by every backend endpoint:
/// `{ "state": bool, "data": ..., "message": "..." }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub state: Option<bool>,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    fn rejection(&self) -> Option<ApiError> {
        if self.state == Some(false) {
            let message = self
                .message
                .clone()
                .unwrap_or_else(|| "request was not accepted".to_string());
            return Some(ApiError::Rejected(message));
        }
        None
    }

    /// Unwrap `data`, turning `state: false` into [`ApiError::Rejected`].
    pub fn into_data(self) -> Result<T, ApiError> {
        if let Some(err) = self.rejection() {
            return Err(err);
        }
        self.data
            .ok_or_else(|| ApiError::InvalidResponse("response has no data".to_string()))
    }

    /// Check `state` only, for endpoints whose `data` is not needed.
    pub fn into_ack(self) -> Result<Option<String>, ApiError> {
        match self.rejection() {
            Some(err) => Err(err),
            None => Ok(self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tour;

    #[test]
    fn test_into_data() {
        let env: Envelope<Vec<Tour>> =
            serde_json::from_str(r#"{"state": true, "data": [{"id": 1, "name": "Sa Pa"}]}"#).unwrap();
        let tours = env.into_data().unwrap();
        assert_eq!(tours[0].name, "Sa Pa");
    }

    #[test]
    fn test_missing_state_with_data_is_ok() {
        let env: Envelope<Vec<i64>> = serde_json::from_str(r#"{"data": [1, 2]}"#).unwrap();
        assert_eq!(env.into_data().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_rejected_carries_message() {
        let env: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"state": false, "message": "Tour not found"}"#).unwrap();
        assert!(matches!(env.into_data(), Err(ApiError::Rejected(m)) if m == "Tour not found"));
    }

    #[test]
    fn test_success_without_data() {
        let env: Envelope<Vec<Tour>> = serde_json::from_str(r#"{"state": true}"#).unwrap();
        assert!(matches!(env.into_data(), Err(ApiError::InvalidResponse(_))));

        let env: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"state": true, "message": "created"}"#).unwrap();
        assert_eq!(env.into_ack().unwrap().as_deref(), Some("created"));
    }
}
