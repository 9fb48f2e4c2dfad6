//! One simulated device on disk: where its files live and how to load them.
//!
//! The engine writes every device to its own folder:
//!
//! ```text
//! {root}/device_{id}/nn.nns         topology
//! {root}/device_{id}/ns_{step}.nns  state at step (-1 = initial, unconnected)
//! {root}/device_{id}/it_{step}.nns  interface at step
//! {root}/device_{id}/mea_{step}.nns micro-electrode array at step
//! {root}/device_{id}/cc_{id}.nns    connected component, largest first
//! ```

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::codec::{self, DecodeOptions};
use crate::components::{ComponentMap, ComponentRecord};
use crate::device::{Datasheet, Interface, Mea, Topology};
use crate::error::{NnsError, Result};
use crate::state::{NetworkState, SparsityPolicy};
use crate::stats::Stats;

/// Step index of the initial, unconnected state.
pub const INITIAL_STEP: i32 = -1;

/// File naming of one device folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    pub root: PathBuf,
    pub device: i32,
}

impl RunLayout {
    pub fn new(root: impl Into<PathBuf>, device: i32) -> Self {
        Self {
            root: root.into(),
            device,
        }
    }

    pub fn device_dir(&self) -> PathBuf {
        self.root.join(format!("device_{}", self.device))
    }

    pub fn topology_path(&self) -> PathBuf {
        self.device_dir().join("nn.nns")
    }

    pub fn state_path(&self, step: i32) -> PathBuf {
        self.device_dir().join(format!("ns_{step}.nns"))
    }

    pub fn interface_path(&self, step: i32) -> PathBuf {
        self.device_dir().join(format!("it_{step}.nns"))
    }

    pub fn mea_path(&self, step: i32) -> PathBuf {
        self.device_dir().join(format!("mea_{step}.nns"))
    }

    pub fn component_path(&self, id: i32) -> PathBuf {
        self.device_dir().join(format!("cc_{id}.nns"))
    }
}

/// Where the files of a session come from.
#[derive(Debug, Clone)]
pub enum Source {
    /// Engine folder layout.
    Layout(RunLayout),
    /// Explicit files; states are indexed by their position in `states`.
    Files {
        topology: PathBuf,
        interface: Option<PathBuf>,
        states: Vec<PathBuf>,
    },
}

impl Source {
    fn topology_path(&self) -> PathBuf {
        match self {
            Source::Layout(layout) => layout.topology_path(),
            Source::Files { topology, .. } => topology.clone(),
        }
    }

    fn state_path(&self, step: i32) -> Result<PathBuf> {
        match self {
            Source::Layout(layout) => Ok(layout.state_path(step)),
            Source::Files { states, .. } => usize::try_from(step)
                .ok()
                .and_then(|i| states.get(i))
                .cloned()
                .ok_or_else(|| {
                    NnsError::InvalidArgument(format!(
                        "step {} not among the {} state files given",
                        step,
                        states.len()
                    ))
                }),
        }
    }

    /// No initial state exists for explicit file lists.
    fn initial_state_path(&self) -> Option<PathBuf> {
        match self {
            Source::Layout(layout) => Some(layout.state_path(INITIAL_STEP)),
            Source::Files { .. } => None,
        }
    }

    fn interface_path(&self, step: i32) -> Option<PathBuf> {
        match self {
            Source::Layout(layout) => Some(layout.interface_path(step)),
            Source::Files { interface, .. } => interface.clone(),
        }
    }

    fn layout(&self) -> Option<&RunLayout> {
        match self {
            Source::Layout(layout) => Some(layout),
            Source::Files { .. } => None,
        }
    }
}

/// Resolve which of `count` loaded steps to output; `None` picks the last.
pub fn select_step(count: usize, step: Option<usize>) -> Result<usize> {
    if count == 0 {
        return Err(NnsError::InvalidArgument("state count must be at least 1".into()));
    }
    let step = step.unwrap_or(count - 1);
    if step >= count {
        return Err(NnsError::InvalidArgument(format!(
            "step {} is outside the {} loaded states",
            step, count
        )));
    }
    Ok(step)
}

/// Where the component map of a session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapOrigin {
    /// Trailing section of the topology file.
    TopologyFile,
    /// Adjacency of the initial state.
    InitialState,
    /// Junction graph of the topology.
    Junctions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionOptions {
    pub decode: DecodeOptions,
    pub sparsity: SparsityPolicy,
}

/// Static data of one run, shared read-only by every snapshot.
#[derive(Debug)]
pub struct Session {
    source: Source,
    options: SessionOptions,
    pub datasheet: Datasheet,
    pub topology: Topology,
    pub components: ComponentMap,
    pub map_origin: MapOrigin,
}

impl Session {
    /// Load datasheet and topology and derive the component map.
    ///
    /// The map comes from the topology file when it carries one, else from
    /// the initial state if that file exists, else from the junction graph.
    pub fn open(source: Source, options: SessionOptions, mut stats: Option<&mut Stats>) -> Result<Self> {
        let _span = tracing::info_span!("open_session").entered();
        let start = Instant::now();

        let file = codec::load_topology(&source.topology_path(), &options.decode, stats.as_deref_mut())?;

        let (components, map_origin) = match (&file.component_ids, source.initial_state_path()) {
            (Some(ids), _) => (ComponentMap::from_ids(ids)?, MapOrigin::TopologyFile),
            (None, Some(initial)) if initial.exists() => {
                let state = load_state_file(&initial, &options, stats.as_deref_mut())?;
                (ComponentMap::from_adjacency(state.adjacency()), MapOrigin::InitialState)
            }
            _ => (ComponentMap::from_topology(&file.topology), MapOrigin::Junctions),
        };
        if components.len() != file.topology.wires_count() {
            return Err(NnsError::ShapeMismatch(format!(
                "component map covers {} nodes, topology has {} wires",
                components.len(),
                file.topology.wires_count()
            )));
        }
        tracing::info!(
            origin = ?map_origin,
            components = components.component_count(),
            dominant = ?components.dominant(),
            dominant_size = components.dominant_size(),
            "components mapped"
        );

        if let Some(s) = stats {
            s.add_phase("open session", start.elapsed());
        }
        Ok(Self {
            source,
            options,
            datasheet: file.datasheet,
            topology: file.topology,
            components,
            map_origin,
        })
    }

    /// Convenience for the engine folder layout.
    pub fn open_device(layout: RunLayout, options: SessionOptions) -> Result<Self> {
        Self::open(Source::Layout(layout), options, None)
    }

    /// Load the state at `step`.
    pub fn load_state(&self, step: i32, stats: Option<&mut Stats>) -> Result<NetworkState> {
        let path = self.source.state_path(step)?;
        load_state_file(&path, &self.options, stats)
    }

    /// Load steps `0..count`, all resident in memory.
    pub fn load_states(&self, count: usize, mut stats: Option<&mut Stats>) -> Result<Vec<NetworkState>> {
        let _span = tracing::info_span!("load_states", count).entered();
        let start = Instant::now();
        let mut states = Vec::with_capacity(count);
        for step in 0..count {
            let step = i32::try_from(step)
                .map_err(|_| NnsError::InvalidArgument(format!("step {step} exceeds i32")))?;
            states.push(self.load_state(step, stats.as_deref_mut())?);
        }
        if let Some(s) = stats {
            s.add_phase("load states", start.elapsed());
        }
        Ok(states)
    }

    /// Lazily load `steps`. Each file is read when the iterator reaches it;
    /// the iterator cannot be rewound, call again to restart.
    pub fn snapshots(&self, steps: Range<i32>) -> Snapshots<'_> {
        Snapshots {
            session: self,
            steps,
        }
    }

    /// Interface at `step`, `None` when the run has no interface file for it.
    pub fn load_interface(&self, step: i32, stats: Option<&mut Stats>) -> Result<Option<Interface>> {
        let Some(path) = self.source.interface_path(step) else {
            return Ok(None);
        };
        if self.source.layout().is_some() && !path.exists() {
            return Ok(None);
        }
        let interface = codec::load_interface(&path, &self.options.decode, stats)?;
        interface.validate(self.topology.wires_count())?;
        Ok(Some(interface))
    }

    /// Electrode array at `step`, `None` when the device folder has none.
    pub fn load_mea(&self, step: i32, stats: Option<&mut Stats>) -> Result<Option<Mea>> {
        let Some(path) = self.source.layout().map(|l| l.mea_path(step)) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let mea = codec::load_mea(&path, &self.options.decode, stats)?;
        mea.validate(self.topology.wires_count())?;
        Ok(Some(mea))
    }

    /// Component `id` as exported by the engine, `None` when not exported.
    pub fn load_component(&self, id: i32, stats: Option<&mut Stats>) -> Result<Option<ComponentRecord>> {
        let Some(path) = self.source.layout().map(|l| l.component_path(id)) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let record = codec::load_component(&path, &self.options.decode, stats)?;
        if record.wires_count > self.topology.wires_count() {
            return Err(NnsError::ShapeMismatch(format!(
                "component {} has {} wires, topology has {}",
                id,
                record.wires_count,
                self.topology.wires_count()
            )));
        }
        Ok(Some(record))
    }
}

fn load_state_file(path: &Path, options: &SessionOptions, stats: Option<&mut Stats>) -> Result<NetworkState> {
    let state = codec::load_state(path, &options.decode, stats)?;
    state.check_sparsity(options.sparsity)?;
    Ok(state)
}

/// Lazy sequence of states, see [`Session::snapshots`].
pub struct Snapshots<'a> {
    session: &'a Session,
    steps: Range<i32>,
}

impl Iterator for Snapshots<'_> {
    type Item = Result<NetworkState>;

    fn next(&mut self) -> Option<Self::Item> {
        let step = self.steps.next()?;
        Some(self.session.load_state(step, None))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.steps.size_hint()
    }
}
