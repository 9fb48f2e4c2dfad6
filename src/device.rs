//! Static description of a simulated device.
//!
//! The datasheet and topology are written once per run by the simulation
//! engine and never change across steps. The interface describes which wires
//! are wired to external instruments at a given step.

use std::cmp::Ordering;

use crate::error::{NnsError, Result};
use crate::matrix::Matrix;

/// A 2D position in µm.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Generation parameters of one device. Field order matches the file layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datasheet {
    pub wires_count: i32,
    /// Mean wire length in µm.
    pub length_mean: f64,
    /// Standard deviation of the wire length in µm.
    pub length_std_dev: f64,
    /// Side of the square package in µm.
    pub package_size: i32,
    pub generation_seed: i32,
}

impl Datasheet {
    /// Plotting bounds on both axes.
    pub fn bounds(&self) -> (f64, f64) {
        (0.0, f64::from(self.package_size))
    }

    /// Order by wires count, then package size, then seed.
    ///
    /// Two datasheets comparing `Equal` describe the same generated device.
    pub fn identity_cmp(&self, other: &Self) -> Ordering {
        self.wires_count
            .cmp(&other.wires_count)
            .then(self.package_size.cmp(&other.package_size))
            .then(self.generation_seed.cmp(&other.generation_seed))
    }
}

/// A nanowire. Identified by its index in `Topology::wires`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wire {
    pub centroid: Point,
    pub start: Point,
    pub end: Point,
    pub length: f64,
}

/// Intersection of two wires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Junction {
    pub first_wire: i32,
    pub second_wire: i32,
    pub position: Point,
}

/// Wires and junctions of a device.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    pub wires: Vec<Wire>,
    pub junctions: Vec<Junction>,
}

impl Topology {
    /// Build a topology, checking every junction references an existing wire.
    pub fn new(wires: Vec<Wire>, junctions: Vec<Junction>) -> Result<Self> {
        let n = wires.len();
        for (k, j) in junctions.iter().enumerate() {
            for wire in [j.first_wire, j.second_wire] {
                if wire < 0 || wire as usize >= n {
                    return Err(NnsError::InvalidTopology(format!(
                        "junction {} references wire {} but only {} wires exist",
                        k, wire, n
                    )));
                }
            }
        }
        Ok(Self { wires, junctions })
    }

    pub fn wires_count(&self) -> usize {
        self.wires.len()
    }

    pub fn junctions_count(&self) -> usize {
        self.junctions.len()
    }

    /// Adjacency of the unconnected network: wires `i` and `j` are adjacent
    /// when a junction joins them. The diagonal stays false.
    pub fn adjacency(&self) -> Matrix<bool> {
        let mut adj = Matrix::new(self.wires.len());
        for j in &self.junctions {
            let (a, b) = (j.first_wire as usize, j.second_wire as usize);
            if a != b {
                adj.set(a, b, true);
                adj.set(b, a, true);
            }
        }
        adj
    }
}

/// How a wire is wired to the outside world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Connection {
    None,
    Source,
    Ground,
    /// External load with its weight in siemens.
    Load(f64),
}

impl Connection {
    /// Numeric tag used in MEA files.
    pub fn code(&self) -> i32 {
        match self {
            Connection::None => 0,
            Connection::Source => 1,
            Connection::Ground => 2,
            Connection::Load(_) => 3,
        }
    }

    /// Inverse of [`Connection::code`]. `weight` is only kept for loads.
    pub fn from_code(code: i32, weight: f64) -> Option<Self> {
        match code {
            0 => Some(Connection::None),
            1 => Some(Connection::Source),
            2 => Some(Connection::Ground),
            3 => Some(Connection::Load(weight)),
            _ => None,
        }
    }
}

/// External load attached to a wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Load {
    pub wire: i32,
    /// Siemens.
    pub weight: f64,
}

/// Sources, grounds and loads attached to the device at one step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Interface {
    pub sources: Vec<i32>,
    pub grounds: Vec<i32>,
    pub loads: Vec<Load>,
}

impl Interface {
    /// Connection of a wire. Sources take precedence over grounds, grounds over loads.
    pub fn connection(&self, wire: i32) -> Connection {
        if self.sources.contains(&wire) {
            Connection::Source
        } else if self.grounds.contains(&wire) {
            Connection::Ground
        } else if let Some(load) = self.loads.iter().find(|l| l.wire == wire) {
            Connection::Load(load.weight)
        } else {
            Connection::None
        }
    }

    /// Check every referenced wire exists in a network of `wires_count` wires.
    pub fn validate(&self, wires_count: usize) -> Result<()> {
        let referenced = self
            .sources
            .iter()
            .chain(&self.grounds)
            .chain(self.loads.iter().map(|l| &l.wire));
        for &wire in referenced {
            if wire < 0 || wire as usize >= wires_count {
                return Err(NnsError::InvalidTopology(format!(
                    "interface references wire {} but only {} wires exist",
                    wire, wires_count
                )));
            }
        }
        Ok(())
    }
}

/// Number of electrodes of a micro-electrode array, laid out as a 4x4 grid.
pub const MEA_ELECTRODES: usize = 16;

/// One electrode of a micro-electrode array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Electrode {
    pub position: Point,
    /// Wire touched by the electrode, if any lies close enough.
    pub wire: Option<usize>,
    pub connection: Connection,
}

/// Micro-electrode array stimulating the device at one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Mea {
    pub electrodes: Vec<Electrode>,
}

impl Mea {
    /// Check every mapped electrode touches an existing wire.
    pub fn validate(&self, wires_count: usize) -> Result<()> {
        for (k, electrode) in self.electrodes.iter().enumerate() {
            if let Some(wire) = electrode.wire.filter(|&w| w >= wires_count) {
                return Err(NnsError::InvalidTopology(format!(
                    "electrode {} touches wire {} but only {} wires exist",
                    k, wire, wires_count
                )));
            }
        }
        Ok(())
    }

    /// Interface seen by the wires. Unmapped electrodes are skipped.
    pub fn to_interface(&self) -> Interface {
        let mut interface = Interface::default();
        for electrode in &self.electrodes {
            let Some(wire) = electrode.wire.and_then(|w| i32::try_from(w).ok()) else {
                continue;
            };
            match electrode.connection {
                Connection::None => {}
                Connection::Source => interface.sources.push(wire),
                Connection::Ground => interface.grounds.push(wire),
                Connection::Load(weight) => interface.loads.push(Load { wire, weight }),
            }
        }
        interface
    }
}
