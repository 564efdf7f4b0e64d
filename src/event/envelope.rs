//! Firehose envelope wire types.
//!
//! Hand-written `prost` messages matching the dropsonde `events.proto`
//! field numbers. Payload fields are decoded as optional so converters can
//! detect structurally absent data instead of reading silent zero defaults.

use std::collections::HashMap;

/// Envelope event type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum EventType {
    Heartbeat = 1,
    HttpStart = 2,
    HttpStop = 3,
    HttpStartStop = 4,
    LogMessage = 5,
    ValueMetric = 6,
    CounterEvent = 7,
    Error = 8,
    ContainerMetric = 9,
}

/// Whether an HTTP event was recorded by the client or the server side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum PeerType {
    Client = 1,
    Server = 2,
}

/// HTTP request method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Method {
    Get = 1,
    Post = 2,
    Put = 3,
    Delete = 4,
    Head = 5,
}

impl Method {
    /// Lowercase method name used in metric paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Head => "head",
        }
    }
}

/// One firehose record.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Envelope {
    #[prost(string, optional, tag = "1")]
    pub origin: Option<String>,
    #[prost(enumeration = "EventType", optional, tag = "2")]
    pub event_type: Option<i32>,
    #[prost(message, optional, tag = "3")]
    pub heartbeat: Option<Heartbeat>,
    #[prost(int64, optional, tag = "6")]
    pub timestamp: Option<i64>,
    #[prost(message, optional, tag = "7")]
    pub http_start_stop: Option<HttpStartStop>,
    #[prost(message, optional, tag = "9")]
    pub value_metric: Option<ValueMetric>,
    #[prost(message, optional, tag = "10")]
    pub counter_event: Option<CounterEvent>,
    #[prost(message, optional, tag = "12")]
    pub container_metric: Option<ContainerMetric>,
    #[prost(string, optional, tag = "13")]
    pub deployment: Option<String>,
    #[prost(string, optional, tag = "14")]
    pub job: Option<String>,
    #[prost(string, optional, tag = "15")]
    pub index: Option<String>,
    #[prost(string, optional, tag = "16")]
    pub ip: Option<String>,
    #[prost(map = "string, string", tag = "17")]
    pub tags: HashMap<String, String>,
}

/// Component liveness counters.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Heartbeat {
    #[prost(uint64, optional, tag = "1")]
    pub sent_count: Option<u64>,
    #[prost(uint64, optional, tag = "2")]
    pub received_count: Option<u64>,
    #[prost(uint64, optional, tag = "3")]
    pub error_count: Option<u64>,
}

/// A completed HTTP request as seen by one peer.
#[derive(Clone, PartialEq, prost::Message)]
pub struct HttpStartStop {
    /// Request start, nanoseconds since the epoch.
    #[prost(int64, optional, tag = "1")]
    pub start_timestamp: Option<i64>,
    /// Request end, nanoseconds since the epoch.
    #[prost(int64, optional, tag = "2")]
    pub stop_timestamp: Option<i64>,
    #[prost(enumeration = "PeerType", optional, tag = "4")]
    pub peer_type: Option<i32>,
    #[prost(enumeration = "Method", optional, tag = "5")]
    pub method: Option<i32>,
    #[prost(string, optional, tag = "6")]
    pub uri: Option<String>,
    #[prost(string, optional, tag = "7")]
    pub remote_address: Option<String>,
    #[prost(string, optional, tag = "8")]
    pub user_agent: Option<String>,
    #[prost(int32, optional, tag = "9")]
    pub status_code: Option<i32>,
    #[prost(int64, optional, tag = "10")]
    pub content_length: Option<i64>,
    #[prost(int32, optional, tag = "13")]
    pub instance_index: Option<i32>,
}

/// A single named measurement reported by a component.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ValueMetric {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(double, optional, tag = "2")]
    pub value: Option<f64>,
    #[prost(string, optional, tag = "3")]
    pub unit: Option<String>,
}

/// An increment of a named counter.
#[derive(Clone, PartialEq, prost::Message)]
pub struct CounterEvent {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(uint64, optional, tag = "2")]
    pub delta: Option<u64>,
    #[prost(uint64, optional, tag = "3")]
    pub total: Option<u64>,
}

/// Resource usage of one application instance.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ContainerMetric {
    #[prost(string, optional, tag = "1")]
    pub application_id: Option<String>,
    #[prost(int32, optional, tag = "2")]
    pub instance_index: Option<i32>,
    #[prost(double, optional, tag = "3")]
    pub cpu_percentage: Option<f64>,
    #[prost(uint64, optional, tag = "4")]
    pub memory_bytes: Option<u64>,
    #[prost(uint64, optional, tag = "5")]
    pub disk_bytes: Option<u64>,
}

impl Envelope {
    /// Set the originating job name and instance index.
    pub fn with_job(mut self, job: impl Into<String>, index: impl Into<String>) -> Self {
        self.job = Some(job.into());
        self.index = Some(index.into());
        self
    }

    /// Set the origin component name.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    fn typed(event_type: EventType) -> Self {
        Self {
            event_type: Some(event_type as i32),
            ..Self::default()
        }
    }
}

impl From<Heartbeat> for Envelope {
    fn from(payload: Heartbeat) -> Self {
        Self {
            heartbeat: Some(payload),
            ..Self::typed(EventType::Heartbeat)
        }
    }
}

impl From<HttpStartStop> for Envelope {
    fn from(payload: HttpStartStop) -> Self {
        Self {
            http_start_stop: Some(payload),
            ..Self::typed(EventType::HttpStartStop)
        }
    }
}

impl From<ValueMetric> for Envelope {
    fn from(payload: ValueMetric) -> Self {
        Self {
            value_metric: Some(payload),
            ..Self::typed(EventType::ValueMetric)
        }
    }
}

impl From<CounterEvent> for Envelope {
    fn from(payload: CounterEvent) -> Self {
        Self {
            counter_event: Some(payload),
            ..Self::typed(EventType::CounterEvent)
        }
    }
}

impl From<ContainerMetric> for Envelope {
    fn from(payload: ContainerMetric) -> Self {
        Self {
            container_metric: Some(payload),
            ..Self::typed(EventType::ContainerMetric)
        }
    }
}

impl ValueMetric {
    /// Create a fully populated value metric.
    pub fn new(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value),
            unit: Some(unit.into()),
        }
    }
}

impl CounterEvent {
    /// Create a counter increment.
    pub fn new(name: impl Into<String>, delta: u64) -> Self {
        Self {
            name: Some(name.into()),
            delta: Some(delta),
            total: None,
        }
    }
}

impl Heartbeat {
    /// Create a heartbeat with all counts set.
    pub fn new(sent: u64, received: u64, errors: u64) -> Self {
        Self {
            sent_count: Some(sent),
            received_count: Some(received),
            error_count: Some(errors),
        }
    }
}

impl ContainerMetric {
    /// Create a container usage sample.
    pub fn new(
        application_id: impl Into<String>,
        instance_index: i32,
        cpu_percentage: f64,
        memory_bytes: u64,
        disk_bytes: u64,
    ) -> Self {
        Self {
            application_id: Some(application_id.into()),
            instance_index: Some(instance_index),
            cpu_percentage: Some(cpu_percentage),
            memory_bytes: Some(memory_bytes),
            disk_bytes: Some(disk_bytes),
        }
    }
}

impl HttpStartStop {
    /// Create a request record with the fields the converter needs.
    pub fn new(start_ns: i64, stop_ns: i64, method: Method, status_code: i32) -> Self {
        Self {
            start_timestamp: Some(start_ns),
            stop_timestamp: Some(stop_ns),
            peer_type: Some(PeerType::Client as i32),
            method: Some(method as i32),
            status_code: Some(status_code),
            ..Self::default()
        }
    }

    /// Set the request URI.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }
}
