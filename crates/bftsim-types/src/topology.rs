//! # bftsim-types::topology
//!
//! Defines the declarative specification for network topologies. The engine's
//! topology builders consume these to construct the switch graph and the
//! endpoint-to-switch attachments.

use crate::errors::TopologyError;
use serde::{Deserialize, Serialize};

/// The topology family selected by a run configuration's `networkType` field.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkType {
    Clique,
    Mesh,
    Torus,
    Butterfly,
    FoldedClos,
}

/// A fully-parsed, validated topology specification.
///
/// `NetworkType` plus the raw `networkParameters` integers from the run
/// configuration are resolved into one of these variants up front, so every
/// downstream topology builder works with named fields instead of re-indexing
/// a parameter array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologySpec {
    /// One proxy switch per endpoint; every proxy is a neighbor of every
    /// other proxy.
    Clique,
    /// An `side x (N/side)` grid, 4-neighborhood, no wraparound.
    Mesh { side: u32 },
    /// Same grid as `Mesh`, but with wraparound on both axes.
    Torus { side: u32 },
    /// A `k`-radix butterfly network. `mode` selects the first-layer
    /// endpoint assignment (0 = flushed, 1 = spread); `scheme` selects the
    /// higher-layer generation rule (0 = maximize group count, 1 = maximize
    /// group size).
    Butterfly { k: u32, mode: u8, scheme: u8 },
    /// Same skeleton as `Butterfly`, but every switch-switch edge is
    /// bidirectional.
    FoldedClos { k: u32, mode: u8, scheme: u8 },
}

impl TopologySpec {
    /// Resolves a `(networkType, networkParameters)` pair from a run
    /// configuration into a validated `TopologySpec`.
    ///
    /// Validation here covers shape only (right parameter count, `mode`/
    /// `scheme` in `{0,1}`); divisibility and reachability are checked by the
    /// individual topology builders, which are the only place that knows `N`.
    pub fn from_parameters(
        network_type: NetworkType,
        parameters: &[i64],
    ) -> Result<Self, TopologyError> {
        fn require(parameters: &[i64], n: usize) -> Result<(), TopologyError> {
            if parameters.len() != n {
                return Err(TopologyError::BadParameterCount {
                    expected: n,
                    got: parameters.len(),
                });
            }
            Ok(())
        }
        fn as_u32(value: i64) -> Result<u32, TopologyError> {
            u32::try_from(value).map_err(|_| TopologyError::InvalidParameter {
                message: format!("parameter {value} is not a valid non-negative u32"),
            })
        }
        fn as_mode_or_scheme(value: i64) -> Result<u8, TopologyError> {
            match value {
                0 => Ok(0),
                1 => Ok(1),
                _ => Err(TopologyError::InvalidParameter {
                    message: format!("parameter {value} must be 0 or 1"),
                }),
            }
        }

        match network_type {
            NetworkType::Clique => {
                require(parameters, 0)?;
                Ok(TopologySpec::Clique)
            }
            NetworkType::Mesh => {
                require(parameters, 1)?;
                Ok(TopologySpec::Mesh {
                    side: as_u32(parameters[0])?,
                })
            }
            NetworkType::Torus => {
                require(parameters, 1)?;
                Ok(TopologySpec::Torus {
                    side: as_u32(parameters[0])?,
                })
            }
            NetworkType::Butterfly => {
                require(parameters, 3)?;
                Ok(TopologySpec::Butterfly {
                    k: as_u32(parameters[0])?,
                    mode: as_mode_or_scheme(parameters[1])?,
                    scheme: as_mode_or_scheme(parameters[2])?,
                })
            }
            NetworkType::FoldedClos => {
                require(parameters, 3)?;
                Ok(TopologySpec::FoldedClos {
                    k: as_u32(parameters[0])?,
                    mode: as_mode_or_scheme(parameters[1])?,
                    scheme: as_mode_or_scheme(parameters[2])?,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clique_takes_no_parameters() {
        assert_eq!(
            TopologySpec::from_parameters(NetworkType::Clique, &[]),
            Ok(TopologySpec::Clique)
        );
        assert!(TopologySpec::from_parameters(NetworkType::Clique, &[1]).is_err());
    }

    #[test]
    fn mesh_requires_one_parameter() {
        assert_eq!(
            TopologySpec::from_parameters(NetworkType::Mesh, &[3]),
            Ok(TopologySpec::Mesh { side: 3 })
        );
        assert!(TopologySpec::from_parameters(NetworkType::Mesh, &[]).is_err());
    }

    #[test]
    fn butterfly_rejects_out_of_range_mode_or_scheme() {
        assert!(TopologySpec::from_parameters(NetworkType::Butterfly, &[5, 2, 0]).is_err());
        assert_eq!(
            TopologySpec::from_parameters(NetworkType::Butterfly, &[5, 1, 0]),
            Ok(TopologySpec::Butterfly {
                k: 5,
                mode: 1,
                scheme: 0
            })
        );
    }
}
