use uuid::Uuid;

/// Failure to extract a device identity from a publish topic.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TopicError {
    /// Fewer than two `/`-separated segments.
    #[error("malformed topic '{0}': expected 'device/<device-id>/data'")]
    Malformed(String),
    /// The device-id segment is not a UUID.
    #[error("device id segment '{0}' is not a valid UUID")]
    InvalidDeviceId(String),
}

/// Extracts the device id from a `device/<device-id>/data` topic.
///
/// Only the second segment is interpreted; the subscription filter already
/// constrains the overall topic shape before a message reaches us.
pub fn parse_device_topic(topic: &str) -> Result<Uuid, TopicError> {
    let mut segments = topic.split('/');
    segments.next();
    let id_segment = segments
        .next()
        .ok_or_else(|| TopicError::Malformed(topic.to_owned()))?;

    Uuid::parse_str(id_segment).map_err(|_| TopicError::InvalidDeviceId(id_segment.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_device_id_from_standard_topic() {
        let id = parse_device_topic("device/123e4567-e89b-12d3-a456-426614174000/data");
        assert_eq!(
            id,
            Ok(Uuid::parse_str("123e4567-e89b-12d3-a456-426614174000").unwrap())
        );
    }

    #[test]
    fn ignores_segments_after_the_device_id() {
        let id = parse_device_topic("device/123e4567-e89b-12d3-a456-426614174000/data/extra");
        assert!(id.is_ok());
    }

    #[test]
    fn rejects_topic_without_separator() {
        let result = parse_device_topic("device");
        assert_eq!(result, Err(TopicError::Malformed("device".to_owned())));
    }

    #[test]
    fn rejects_empty_topic() {
        let result = parse_device_topic("");
        assert_eq!(result, Err(TopicError::Malformed(String::new())));
    }

    #[test]
    fn rejects_non_uuid_device_segment() {
        let result = parse_device_topic("device/not-a-uuid/data");
        assert_eq!(
            result,
            Err(TopicError::InvalidDeviceId("not-a-uuid".to_owned()))
        );
    }

    #[test]
    fn rejects_empty_device_segment() {
        let result = parse_device_topic("device//data");
        assert_eq!(result, Err(TopicError::InvalidDeviceId(String::new())));
    }
}
