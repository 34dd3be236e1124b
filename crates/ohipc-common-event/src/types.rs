//! Parcelables carried by the common event interfaces.

use ohipc_core::{MessageParcel, Parcelable};
use ohipc_errors::{ParcelError, ParcelResult};
use ohipc_types::Want;
use serde::{Deserialize, Serialize};

/// An event: the want naming it plus a result code and data string that
/// ordered receivers may rewrite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommonEventData {
    /// Event want; its action is the event name.
    pub want: Want,
    /// Result code.
    pub code: i32,
    /// Result data.
    pub data: String,
}

impl CommonEventData {
    /// Event data for `want` with a zero code and empty data.
    #[must_use]
    pub fn new(want: Want) -> Self {
        Self {
            want,
            ..Self::default()
        }
    }

    /// Set code and data.
    #[must_use]
    pub fn with_result(mut self, code: i32, data: impl Into<String>) -> Self {
        self.code = code;
        self.data = data.into();
        self
    }

    /// Event name.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.want.action
    }
}

impl Parcelable for CommonEventData {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        self.want.marshal(parcel)?;
        parcel.write_i32(self.code)?;
        parcel.write_string(&self.data)
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        Ok(Self {
            want: Want::unmarshal(parcel)?,
            code: parcel.read_i32()?,
            data: parcel.read_string()?,
        })
    }
}

/// How an event is published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonEventPublishInfo {
    /// Keep the event for late subscribers.
    pub sticky: bool,
    /// Deliver to subscribers one at a time by priority.
    pub ordered: bool,
    /// Only subscribers of this bundle receive the event, if set.
    pub bundle_name: String,
    /// Permissions a subscriber must hold.
    pub subscriber_permissions: Vec<String>,
}

impl CommonEventPublishInfo {
    /// Default publish info: unordered, not sticky.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sticky flag.
    #[must_use]
    pub fn sticky(mut self, sticky: bool) -> Self {
        self.sticky = sticky;
        self
    }

    /// Set the ordered flag.
    #[must_use]
    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }
}

impl Parcelable for CommonEventPublishInfo {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_bool(self.sticky)?;
        parcel.write_bool(self.ordered)?;
        parcel.write_string(&self.bundle_name)?;
        parcel.write_string_vector(&self.subscriber_permissions)
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        Ok(Self {
            sticky: parcel.read_bool()?,
            ordered: parcel.read_bool()?,
            bundle_name: parcel.read_string()?,
            subscriber_permissions: parcel.read_string_vector()?,
        })
    }
}

/// Filter deciding which events a subscriber receives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingSkills {
    /// Accepted event names.
    pub events: Vec<String>,
    /// Entities the event want must list, all of them.
    pub entities: Vec<String>,
    /// Accepted uri schemes; empty accepts any.
    pub schemes: Vec<String>,
}

impl MatchingSkills {
    /// Skills accepting `events`.
    pub fn for_events<I, S>(events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            events: events.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Whether `event` is one of the accepted names.
    #[must_use]
    pub fn has_event(&self, event: &str) -> bool {
        self.events.iter().any(|e| e == event)
    }

    /// Whether an event carrying `want` passes the filter.
    #[must_use]
    pub fn matches(&self, want: &Want) -> bool {
        if !self.has_event(&want.action) {
            return false;
        }
        if !self.entities.iter().all(|entity| want.has_entity(entity)) {
            return false;
        }
        if self.schemes.is_empty() {
            return true;
        }
        want.uri
            .as_ref()
            .and_then(|uri| uri.scheme())
            .is_some_and(|scheme| self.schemes.iter().any(|s| s == scheme))
    }
}

impl Parcelable for MatchingSkills {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_string_vector(&self.events)?;
        parcel.write_string_vector(&self.entities)?;
        parcel.write_string_vector(&self.schemes)
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        Ok(Self {
            events: parcel.read_string_vector()?,
            entities: parcel.read_string_vector()?,
            schemes: parcel.read_string_vector()?,
        })
    }
}

/// Thread a subscriber wants its callbacks on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum ThreadMode {
    /// The subscriber's event handler thread.
    #[default]
    Handler = 0,
    /// Posted to the subscriber's main loop.
    Post = 1,
    /// A worker thread.
    Async = 2,
    /// The delivering thread.
    Background = 3,
}

impl ThreadMode {
    fn from_code(code: u32) -> ParcelResult<Self> {
        match code {
            0 => Ok(ThreadMode::Handler),
            1 => Ok(ThreadMode::Post),
            2 => Ok(ThreadMode::Async),
            3 => Ok(ThreadMode::Background),
            other => Err(ParcelError::invalid_enum("thread mode", other)),
        }
    }
}

/// What a subscriber listens for and how.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonEventSubscribeInfo {
    /// Event filter.
    pub matching_skills: MatchingSkills,
    /// Ordered delivery priority, higher first.
    pub priority: i32,
    /// User the subscriber belongs to.
    pub user_id: i32,
    /// Permission a publisher must hold.
    pub permission: String,
    /// Device the subscriber listens on.
    pub device_id: String,
    /// Callback thread.
    pub thread_mode: ThreadMode,
}

impl CommonEventSubscribeInfo {
    /// Subscribe info with `matching_skills` and defaults elsewhere.
    #[must_use]
    pub fn new(matching_skills: MatchingSkills) -> Self {
        Self {
            matching_skills,
            ..Self::default()
        }
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the user id.
    #[must_use]
    pub fn with_user_id(mut self, user_id: i32) -> Self {
        self.user_id = user_id;
        self
    }
}

impl Parcelable for CommonEventSubscribeInfo {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        self.matching_skills.marshal(parcel)?;
        parcel.write_i32(self.priority)?;
        parcel.write_i32(self.user_id)?;
        parcel.write_string(&self.permission)?;
        parcel.write_string(&self.device_id)?;
        parcel.write_u32(self.thread_mode as u32)
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        Ok(Self {
            matching_skills: MatchingSkills::unmarshal(parcel)?,
            priority: parcel.read_i32()?,
            user_id: parcel.read_i32()?,
            permission: parcel.read_string()?,
            device_id: parcel.read_string()?,
            thread_mode: ThreadMode::from_code(parcel.read_u32()?)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_by_event_entity_scheme() {
        let mut skills = MatchingSkills::for_events(["usual.event.SCREEN_ON"]);
        let want = Want::new("usual.event.SCREEN_ON");
        assert!(skills.matches(&want));
        assert!(!skills.matches(&Want::new("usual.event.SCREEN_OFF")));

        skills.entities.push("entity.home".to_string());
        assert!(!skills.matches(&want));
        let want = want.with_entity("entity.home");
        assert!(skills.matches(&want));

        skills.schemes.push("file".to_string());
        assert!(!skills.matches(&want));
        assert!(skills.matches(&want.with_uri("file:///tmp/x")));
    }

    #[test]
    fn test_bad_thread_mode_rejected() -> ParcelResult<()> {
        let mut info = CommonEventSubscribeInfo::new(MatchingSkills::for_events(["e"]));
        info.thread_mode = ThreadMode::Background;
        let mut parcel = MessageParcel::new();
        info.marshal(&mut parcel)?;
        let mut bytes = parcel.as_bytes().to_vec();
        let len = bytes.len();
        if let Some(last) = bytes.get_mut(len.saturating_sub(4)) {
            *last = 9;
        }
        let mut tampered = MessageParcel::from_bytes(&bytes);
        assert!(matches!(
            CommonEventSubscribeInfo::unmarshal(&mut tampered),
            Err(ParcelError::InvalidEnum { value: 9, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_event_data_round_trip() -> ParcelResult<()> {
        let data = CommonEventData::new(Want::new("e")).with_result(3, "payload");
        let mut parcel = MessageParcel::new();
        parcel.write_parcelable(Some(&data))?;
        assert_eq!(parcel.read_parcelable::<CommonEventData>()?, Some(data));
        Ok(())
    }
}
