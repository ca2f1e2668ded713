use crate::core::models::ids::NodeId;
use crate::core::models::port::SeparationPolicy;
use thiserror::Error;

pub const DEFAULT_ALIGNMENT_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

/// Explicit unit and tolerance conventions for the assembly engines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Separation rule for ports created by particle removal.
    pub separation: SeparationPolicy,
    /// Angle, in radians, below which two directions are treated as parallel or opposite.
    pub alignment_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            separation: SeparationPolicy::default(),
            alignment_tolerance: DEFAULT_ALIGNMENT_TOLERANCE,
        }
    }
}

#[derive(Default)]
pub struct EngineConfigBuilder {
    separation: Option<SeparationPolicy>,
    alignment_tolerance: Option<f64>,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn separation(mut self, policy: SeparationPolicy) -> Self {
        self.separation = Some(policy);
        self
    }
    pub fn alignment_tolerance(mut self, tolerance: f64) -> Self {
        self.alignment_tolerance = Some(tolerance);
        self
    }

    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        let separation = self.separation.unwrap_or_default();
        if let SeparationPolicy::Fixed(value) = separation {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue {
                    parameter: "separation",
                    reason: format!("fixed separation must be positive, got {}", value),
                });
            }
        }
        let alignment_tolerance = self
            .alignment_tolerance
            .unwrap_or(DEFAULT_ALIGNMENT_TOLERANCE);
        if !(alignment_tolerance.is_finite() && alignment_tolerance >= 0.0) {
            return Err(ConfigError::InvalidValue {
                parameter: "alignment_tolerance",
                reason: format!("must be a non-negative angle, got {}", alignment_tolerance),
            });
        }
        Ok(EngineConfig {
            separation,
            alignment_tolerance,
        })
    }
}

/// Names a detached template root and the label of the port used to attach its copies.
#[derive(Debug, Clone, PartialEq)]
pub struct GuestSpec {
    pub template: NodeId,
    pub port: String,
}

impl GuestSpec {
    pub fn new(template: NodeId, port: &str) -> Self {
        Self {
            template,
            port: port.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolymerSpec {
    pub label: String,
    pub monomer: NodeId,
    /// Port on each monomer copy that bonds to the previous copy.
    pub head_port: String,
    /// Port on each monomer copy that the next copy bonds to.
    pub tail_port: String,
    pub count: usize,
    pub head_cap: Option<GuestSpec>,
    pub tail_cap: Option<GuestSpec>,
}

#[derive(Default)]
pub struct PolymerSpecBuilder {
    label: Option<String>,
    monomer: Option<NodeId>,
    head_port: Option<String>,
    tail_port: Option<String>,
    count: Option<usize>,
    head_cap: Option<GuestSpec>,
    tail_cap: Option<GuestSpec>,
}

impl PolymerSpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
    pub fn monomer(mut self, monomer: NodeId) -> Self {
        self.monomer = Some(monomer);
        self
    }
    pub fn ports(mut self, head: &str, tail: &str) -> Self {
        self.head_port = Some(head.to_string());
        self.tail_port = Some(tail.to_string());
        self
    }
    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
    pub fn head_cap(mut self, cap: GuestSpec) -> Self {
        self.head_cap = Some(cap);
        self
    }
    pub fn tail_cap(mut self, cap: GuestSpec) -> Self {
        self.tail_cap = Some(cap);
        self
    }

    pub fn build(self) -> Result<PolymerSpec, ConfigError> {
        let count = self.count.ok_or(ConfigError::MissingParameter("count"))?;
        if count == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "count",
                reason: "a polymer needs at least one monomer".to_string(),
            });
        }
        let head_port = self
            .head_port
            .ok_or(ConfigError::MissingParameter("head_port"))?;
        let tail_port = self
            .tail_port
            .ok_or(ConfigError::MissingParameter("tail_port"))?;
        if head_port == tail_port {
            return Err(ConfigError::InvalidValue {
                parameter: "tail_port",
                reason: format!("head and tail ports are both '{}'", head_port),
            });
        }
        Ok(PolymerSpec {
            label: self.label.unwrap_or_else(|| "polymer".to_string()),
            monomer: self
                .monomer
                .ok_or(ConfigError::MissingParameter("monomer"))?,
            head_port,
            tail_port,
            count,
            head_cap: self.head_cap,
            tail_cap: self.tail_cap,
        })
    }
}
