//! Binary decoders for the engine's `.nns` files.
//!
//! Every layout is little-endian and packed. Each section checks that enough
//! bytes remain before any value is decoded, so a short file fails with
//! `TruncatedFile` instead of yielding partial data.
//!
//! ```text
//! topology   version:i32  datasheet:(i32 f64 f64 i32 i32)  junctions:i32
//!            wires:[f64; 7] * W  junctions:(i32 i32 f64 f64) * J  [map:i32 * W]
//! state      version:i32  size:i32  A:u8 * N*N  Y:f64 * N*N  V:f64 * N
//! interface  version:i32  n:i32 sources:i32 * n  n:i32 grounds:i32 * n
//!            n:i32 loads:i32 * n  weights:f64 * n
//! mea        version:i32  positions:(f64 f64) * 16  wires:i32 * 16
//!            connections:i32 * 16  weights:f64 * 16
//! component  version:i32  wires:i32 junctions:i32 wires_skip:i32
//!            junctions_skip:i32  indices:i32 * junctions
//! ```

use nom::bytes::complete::take;
use nom::combinator::map;
use nom::error::Error as NomError;
use nom::multi::count;
use nom::number::complete::{le_f64, le_i32};
use nom::IResult;
use nom::Parser;

use super::{DecodeOptions, TopologyFile, TopologyVariant, FORMAT_VERSION};
use crate::components::ComponentRecord;
use crate::device::{
    Connection, Datasheet, Electrode, Interface, Junction, Load, Mea, Point, Topology, Wire, MEA_ELECTRODES,
};
use crate::error::{NnsError, Result};
use crate::matrix::Matrix;
use crate::state::NetworkState;

pub const INT_SIZE: usize = 4;
pub const DOUBLE_SIZE: usize = 8;
pub const BOOL_SIZE: usize = 1;

pub const DATASHEET_SIZE: usize = 3 * INT_SIZE + 2 * DOUBLE_SIZE;
pub const WIRE_SIZE: usize = 7 * DOUBLE_SIZE;
pub const JUNCTION_SIZE: usize = 2 * INT_SIZE + 2 * DOUBLE_SIZE;
pub const POINT_SIZE: usize = 2 * DOUBLE_SIZE;

type Bytes<'a> = &'a [u8];

/// Decode a topology file from memory.
pub fn decode_topology(data: &[u8], options: &DecodeOptions) -> Result<TopologyFile> {
    let mut decoder = Decoder::new(data);
    decoder.version(options)?;

    let datasheet = decoder.section("datasheet", DATASHEET_SIZE, datasheet)?;
    let wires_count = to_count("wires", datasheet.wires_count)?;
    let junctions_count = decoder.count("junctions")?;

    let wires = decoder.section(
        "wires",
        record_bytes(wires_count, WIRE_SIZE),
        count(wire, wires_count),
    )?;
    let junctions = decoder.section(
        "junctions",
        record_bytes(junctions_count, JUNCTION_SIZE),
        count(junction, junctions_count),
    )?;

    let component_ids = match options.variant {
        TopologyVariant::Plain => None,
        TopologyVariant::WithComponentMap => {
            let ids = decoder.section(
                "component map",
                record_bytes(wires_count, INT_SIZE),
                count(le_i32, wires_count),
            )?;
            let in_range = |id: i32| usize::try_from(id).is_ok_and(|id| id < wires_count);
            if let Some(pos) = ids.iter().position(|&id| !in_range(id)) {
                return Err(NnsError::InvalidTopology(format!(
                    "wire {} mapped to component {}, expected 0..{}",
                    pos, ids[pos], wires_count
                )));
            }
            Some(ids)
        }
    };
    decoder.finish("topology");

    let topology = Topology::new(wires, junctions)?;
    Ok(TopologyFile {
        datasheet,
        topology,
        component_ids,
    })
}

/// Decode a state file from memory.
pub fn decode_state(data: &[u8], options: &DecodeOptions) -> Result<NetworkState> {
    let mut decoder = Decoder::new(data);
    decoder.version(options)?;

    let size = decoder.count("nodes")?;
    let cells = size.checked_mul(size).unwrap_or(usize::MAX);

    let adjacency = decoder.section("adjacency", record_bytes(cells, BOOL_SIZE), take(cells))?;
    let adjacency = adjacency.iter().map(|&b| b != 0).collect();
    let admittance = decoder.section(
        "admittance",
        record_bytes(cells, DOUBLE_SIZE),
        count(le_f64, cells),
    )?;
    let voltages = decoder.section(
        "voltages",
        record_bytes(size, DOUBLE_SIZE),
        count(le_f64, size),
    )?;
    decoder.finish("state");

    NetworkState::new(
        Matrix::from_row_major(size, adjacency)?,
        Matrix::from_row_major(size, admittance)?,
        voltages,
    )
}

/// Decode an interface file from memory.
pub fn decode_interface(data: &[u8], options: &DecodeOptions) -> Result<Interface> {
    let mut decoder = Decoder::new(data);
    decoder.version(options)?;

    let n = decoder.count("sources")?;
    let sources = decoder.section("sources", record_bytes(n, INT_SIZE), count(le_i32, n))?;
    let n = decoder.count("grounds")?;
    let grounds = decoder.section("grounds", record_bytes(n, INT_SIZE), count(le_i32, n))?;
    let n = decoder.count("loads")?;
    let wires = decoder.section("loads", record_bytes(n, INT_SIZE), count(le_i32, n))?;
    let weights = decoder.section(
        "load weights",
        record_bytes(n, DOUBLE_SIZE),
        count(le_f64, n),
    )?;
    decoder.finish("interface");

    let loads = wires
        .into_iter()
        .zip(weights)
        .map(|(wire, weight)| Load { wire, weight })
        .collect();
    Ok(Interface {
        sources,
        grounds,
        loads,
    })
}

/// Decode a micro-electrode array file from memory.
pub fn decode_mea(data: &[u8], options: &DecodeOptions) -> Result<Mea> {
    let mut decoder = Decoder::new(data);
    decoder.version(options)?;

    let n = MEA_ELECTRODES;
    let positions = decoder.section("electrode positions", n * POINT_SIZE, count(point, n))?;
    let wires = decoder.section("electrode wires", n * INT_SIZE, count(le_i32, n))?;
    let codes = decoder.section("electrode connections", n * INT_SIZE, count(le_i32, n))?;
    let weights = decoder.section("electrode weights", n * DOUBLE_SIZE, count(le_f64, n))?;
    decoder.finish("mea");

    let mut electrodes = Vec::with_capacity(n);
    for k in 0..n {
        // -1 marks an electrode too far from every wire
        let wire = match wires[k] {
            -1 => None,
            w => Some(usize::try_from(w).map_err(|_| {
                NnsError::InvalidTopology(format!("electrode {k} mapped to wire {w}"))
            })?),
        };
        let connection = Connection::from_code(codes[k], weights[k]).ok_or_else(|| {
            NnsError::InvalidTopology(format!("electrode {} has connection type {}", k, codes[k]))
        })?;
        electrodes.push(Electrode {
            position: positions[k],
            wire,
            connection,
        });
    }
    Ok(Mea { electrodes })
}

/// Decode a connected-component file from memory.
pub fn decode_component(data: &[u8], options: &DecodeOptions) -> Result<ComponentRecord> {
    let mut decoder = Decoder::new(data);
    decoder.version(options)?;

    let wires_count = decoder.count("component wires")?;
    let junctions_count = decoder.count("component junctions")?;
    let wires_skip = decoder.count("wires skip")?;
    let junctions_skip = decoder.count("junctions skip")?;
    let indices = decoder.section(
        "junction indices",
        record_bytes(junctions_count, INT_SIZE),
        count(le_i32, junctions_count),
    )?;
    decoder.finish("component");

    let junctions = indices
        .into_iter()
        .map(|index| to_count("junction indices", index))
        .collect::<Result<Vec<_>>>()?;
    ComponentRecord::new(wires_count, wires_skip, junctions_skip, junctions)
}

// ---------------------------------------------------------------------------
// Section driver
// ---------------------------------------------------------------------------

struct Decoder<'a> {
    rest: Bytes<'a>,
    consumed: usize,
}

impl<'a> Decoder<'a> {
    fn new(data: Bytes<'a>) -> Self {
        Self {
            rest: data,
            consumed: 0,
        }
    }

    /// Run `parser` on the next `needed` bytes.
    fn section<O, P>(&mut self, section: &'static str, needed: usize, mut parser: P) -> Result<O>
    where
        P: Parser<Bytes<'a>, Output = O, Error = NomError<Bytes<'a>>>,
    {
        let available = self.rest.len();
        if available < needed {
            return Err(NnsError::TruncatedFile {
                section,
                needed,
                available,
            });
        }
        let (rest, out) = parser.parse(self.rest).map_err(|_| NnsError::TruncatedFile {
            section,
            needed,
            available,
        })?;
        self.consumed += available - rest.len();
        self.rest = rest;
        Ok(out)
    }

    fn version(&mut self, options: &DecodeOptions) -> Result<()> {
        if options.version != FORMAT_VERSION {
            return Err(NnsError::InvalidArgument(format!(
                "cannot decode version {} files, only version {} is supported",
                options.version, FORMAT_VERSION
            )));
        }
        let found = self.section("version", INT_SIZE, le_i32)?;
        if found != options.version {
            return Err(NnsError::UnsupportedVersion {
                found,
                expected: options.version,
            });
        }
        Ok(())
    }

    fn count(&mut self, section: &'static str) -> Result<usize> {
        let raw = self.section(section, INT_SIZE, le_i32)?;
        to_count(section, raw)
    }

    fn finish(&self, kind: &'static str) {
        if !self.rest.is_empty() {
            tracing::debug!(
                kind,
                consumed = self.consumed,
                trailing = self.rest.len(),
                "ignoring trailing bytes"
            );
        }
    }
}

fn to_count(section: &'static str, raw: i32) -> Result<usize> {
    usize::try_from(raw).map_err(|_| NnsError::InvalidCount { section, count: raw })
}

/// Byte length of `n` records, saturating so absurd counts read as truncation.
fn record_bytes(n: usize, record: usize) -> usize {
    n.checked_mul(record).unwrap_or(usize::MAX)
}

// ---------------------------------------------------------------------------
// Record parsers
// ---------------------------------------------------------------------------

fn point(input: Bytes) -> IResult<Bytes, Point> {
    map((le_f64, le_f64), |(x, y)| Point { x, y }).parse(input)
}

fn datasheet(input: Bytes) -> IResult<Bytes, Datasheet> {
    map(
        (le_i32, le_f64, le_f64, le_i32, le_i32),
        |(wires_count, length_mean, length_std_dev, package_size, generation_seed)| Datasheet {
            wires_count,
            length_mean,
            length_std_dev,
            package_size,
            generation_seed,
        },
    )
    .parse(input)
}

fn wire(input: Bytes) -> IResult<Bytes, Wire> {
    map((point, point, point, le_f64), |(centroid, start, end, length)| Wire {
        centroid,
        start,
        end,
        length,
    })
    .parse(input)
}

fn junction(input: Bytes) -> IResult<Bytes, Junction> {
    map((le_i32, le_i32, point), |(first_wire, second_wire, position)| Junction {
        first_wire,
        second_wire,
        position,
    })
    .parse(input)
}
