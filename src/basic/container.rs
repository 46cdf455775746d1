//! Component arenas in canonical storage order.
//!
//! Every category is stored in one `Vec`. Categories with several subtypes keep the
//! instances of a subtype contiguous, ordered by [`Subtype::ALL`], so the coupling slice
//! of a subtype starts at the prefix count of the subtypes before it
//! ([`CategoryOffsets`]).

use std::collections::HashMap;
use std::marker::PhantomData;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::config::CalculationConfig;
use super::elements::*;
use super::error::{ConstructionError, ConstructionResult, InputError};

/// Prefix counts of the subtypes of one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOffsets<K: Subtype> {
    starts: Vec<usize>,
    _kind: PhantomData<K>,
}

impl<K: Subtype> CategoryOffsets<K> {
    /// Offsets of a category whose instances have the given subtypes, in storage order.
    pub fn from_kinds(kinds: impl IntoIterator<Item = K>) -> Self {
        let mut counts = vec![0; K::ALL.len()];
        for kind in kinds {
            counts[kind.index()] += 1;
        }
        let mut starts = Vec::with_capacity(counts.len() + 1);
        starts.push(0);
        for count in counts {
            let last = starts[starts.len() - 1];
            starts.push(last + count);
        }
        Self {
            starts,
            _kind: PhantomData,
        }
    }

    /// Number of instances of the subtypes stored before `kind`.
    pub fn offset(&self, kind: K) -> usize {
        self.starts[kind.index()]
    }

    pub fn count(&self, kind: K) -> usize {
        self.starts[kind.index() + 1] - self.starts[kind.index()]
    }

    pub fn range(&self, kind: K) -> Range<usize> {
        self.offset(kind)..self.starts[kind.index() + 1]
    }

    pub fn total(&self) -> usize {
        self.starts[K::ALL.len()]
    }
}

impl<K: Subtype> Default for CategoryOffsets<K> {
    fn default() -> Self {
        Self::from_kinds(std::iter::empty())
    }
}

/// Subtype offsets of every multi-subtype category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceOffsets {
    pub branch: CategoryOffsets<BranchKind>,
    pub branch3: CategoryOffsets<Branch3Kind>,
    pub load_gen: CategoryOffsets<LoadGenKind>,
    pub voltage_sensor: CategoryOffsets<SensorKind>,
    pub power_sensor: CategoryOffsets<SensorKind>,
}

/// Category and position of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentIdx {
    pub kind: ComponentKind,
    pub idx: usize,
}

/// Input tables of a grid, one per concrete component type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridInput {
    pub node: Vec<NodeInput>,
    pub line: Vec<LineInput>,
    pub link: Vec<LinkInput>,
    pub transformer: Vec<TransformerInput>,
    pub three_winding_transformer: Vec<ThreeWindingTransformerInput>,
    pub source: Vec<SourceInput>,
    pub sym_load: Vec<SymLoadGenInput>,
    pub sym_gen: Vec<SymLoadGenInput>,
    pub asym_load: Vec<AsymLoadGenInput>,
    pub asym_gen: Vec<AsymLoadGenInput>,
    pub shunt: Vec<ShuntInput>,
    pub sym_voltage_sensor: Vec<SymVoltageSensorInput>,
    pub asym_voltage_sensor: Vec<AsymVoltageSensorInput>,
    pub sym_power_sensor: Vec<SymPowerSensorInput>,
    pub asym_power_sensor: Vec<AsymPowerSensorInput>,
    pub fault: Vec<FaultInput>,
}

/// Immutable component storage of one model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentContainer {
    nodes: Vec<Node>,
    branches: Vec<Branch>,
    branch3s: Vec<Branch3>,
    sources: Vec<Source>,
    load_gens: Vec<LoadGen>,
    shunts: Vec<Shunt>,
    voltage_sensors: Vec<VoltageSensor>,
    power_sensors: Vec<PowerSensor>,
    faults: Vec<Fault>,
    offsets: SequenceOffsets,
    id_map: HashMap<ID, ComponentIdx>,
}

/// Collects components in any order; [`ContainerBuilder::finish`] sorts them into
/// canonical order and indexes their ids.
#[derive(Debug, Clone, Default)]
pub struct ContainerBuilder {
    inner: ComponentContainer,
}

impl ContainerBuilder {
    pub fn add_node(&mut self, node: Node) -> &mut Self {
        self.inner.nodes.push(node);
        self
    }

    pub fn add_branch(&mut self, branch: Branch) -> &mut Self {
        self.inner.branches.push(branch);
        self
    }

    pub fn add_branch3(&mut self, branch3: Branch3) -> &mut Self {
        self.inner.branch3s.push(branch3);
        self
    }

    pub fn add_source(&mut self, source: Source) -> &mut Self {
        self.inner.sources.push(source);
        self
    }

    pub fn add_load_gen(&mut self, load_gen: LoadGen) -> &mut Self {
        self.inner.load_gens.push(load_gen);
        self
    }

    pub fn add_shunt(&mut self, shunt: Shunt) -> &mut Self {
        self.inner.shunts.push(shunt);
        self
    }

    pub fn add_voltage_sensor(&mut self, sensor: VoltageSensor) -> &mut Self {
        self.inner.voltage_sensors.push(sensor);
        self
    }

    pub fn add_power_sensor(&mut self, sensor: PowerSensor) -> &mut Self {
        self.inner.power_sensors.push(sensor);
        self
    }

    pub fn add_fault(&mut self, fault: Fault) -> &mut Self {
        self.inner.faults.push(fault);
        self
    }

    pub fn finish(self) -> ConstructionResult<ComponentContainer> {
        let mut c = self.inner;
        // stable sorts keep the insertion order within a subtype
        c.branches.sort_by_key(|b| b.kind().index());
        c.branch3s.sort_by_key(|b| b.kind().index());
        c.load_gens.sort_by_key(|l| l.kind().index());
        c.voltage_sensors.sort_by_key(|s| s.kind().index());
        c.power_sensors.sort_by_key(|s| s.kind().index());

        c.offsets = SequenceOffsets {
            branch: CategoryOffsets::from_kinds(c.branches.iter().map(Branch::kind)),
            branch3: CategoryOffsets::from_kinds(c.branch3s.iter().map(Branch3::kind)),
            load_gen: CategoryOffsets::from_kinds(c.load_gens.iter().map(LoadGen::kind)),
            voltage_sensor: CategoryOffsets::from_kinds(c.voltage_sensors.iter().map(VoltageSensor::kind)),
            power_sensor: CategoryOffsets::from_kinds(c.power_sensors.iter().map(PowerSensor::kind)),
        };

        let mut id_map = HashMap::new();
        let entries = (c.nodes.iter().enumerate().map(|(i, x)| (x.id(), ComponentKind::Node, i)))
            .chain(c.branches.iter().enumerate().map(|(i, x)| (x.id(), ComponentKind::Branch(x.kind()), i)))
            .chain(c.branch3s.iter().enumerate().map(|(i, x)| (x.id(), ComponentKind::Branch3(x.kind()), i)))
            .chain(c.sources.iter().enumerate().map(|(i, x)| (x.id(), ComponentKind::Source, i)))
            .chain(c.load_gens.iter().enumerate().map(|(i, x)| (x.id(), ComponentKind::LoadGen(x.kind()), i)))
            .chain(c.shunts.iter().enumerate().map(|(i, x)| (x.id(), ComponentKind::Shunt, i)))
            .chain(
                c.voltage_sensors
                    .iter()
                    .enumerate()
                    .map(|(i, x)| (x.id(), ComponentKind::VoltageSensor(x.kind()), i)),
            )
            .chain(
                c.power_sensors
                    .iter()
                    .enumerate()
                    .map(|(i, x)| (x.id(), ComponentKind::PowerSensor(x.kind()), i)),
            )
            .chain(c.faults.iter().enumerate().map(|(i, x)| (x.id(), ComponentKind::Fault, i)));
        for (id, kind, idx) in entries {
            if id_map.insert(id, ComponentIdx { kind, idx }).is_some() {
                return Err(ConstructionError::ConflictId(id));
            }
        }
        c.id_map = id_map;
        Ok(c)
    }
}

impl ComponentContainer {
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::default()
    }

    /// Builds every component of `input`, resolving the rated voltage of the nodes
    /// each component connects to.
    pub fn from_input(input: &GridInput, config: &CalculationConfig) -> ConstructionResult<Self> {
        let mut kinds = HashMap::new();
        let mut register = |id: ID, kind: ComponentKind| match kinds.insert(id, kind) {
            Some(_) => Err(ConstructionError::ConflictId(id)),
            None => Ok(()),
        };
        for x in &input.node {
            register(x.id, ComponentKind::Node)?;
        }
        for x in &input.line {
            register(x.id, ComponentKind::Branch(BranchKind::Line))?;
        }
        for x in &input.link {
            register(x.id, ComponentKind::Branch(BranchKind::Link))?;
        }
        for x in &input.transformer {
            register(x.id, ComponentKind::Branch(BranchKind::Transformer))?;
        }
        for x in &input.three_winding_transformer {
            register(x.id, ComponentKind::Branch3(Branch3Kind::ThreeWindingTransformer))?;
        }
        for x in &input.source {
            register(x.id, ComponentKind::Source)?;
        }
        for x in &input.sym_load {
            register(x.id, ComponentKind::LoadGen(LoadGenKind::SymLoad))?;
        }
        for x in &input.sym_gen {
            register(x.id, ComponentKind::LoadGen(LoadGenKind::SymGen))?;
        }
        for x in &input.asym_load {
            register(x.id, ComponentKind::LoadGen(LoadGenKind::AsymLoad))?;
        }
        for x in &input.asym_gen {
            register(x.id, ComponentKind::LoadGen(LoadGenKind::AsymGen))?;
        }
        for x in &input.shunt {
            register(x.id, ComponentKind::Shunt)?;
        }
        for x in &input.sym_voltage_sensor {
            register(x.id, ComponentKind::VoltageSensor(SensorKind::Sym))?;
        }
        for x in &input.asym_voltage_sensor {
            register(x.id, ComponentKind::VoltageSensor(SensorKind::Asym))?;
        }
        for x in &input.sym_power_sensor {
            register(x.id, ComponentKind::PowerSensor(SensorKind::Sym))?;
        }
        for x in &input.asym_power_sensor {
            register(x.id, ComponentKind::PowerSensor(SensorKind::Asym))?;
        }
        for x in &input.fault {
            register(x.id, ComponentKind::Fault)?;
        }

        let u_rated: HashMap<ID, f64> = input.node.iter().map(|n| (n.id, n.u_rated)).collect();
        let node_u = |id: ID| -> ConstructionResult<f64> {
            match (u_rated.get(&id), kinds.contains_key(&id)) {
                (Some(u), _) => Ok(*u),
                (None, true) => Err(ConstructionError::IdWrongType(id)),
                (None, false) => Err(ConstructionError::IdNotFound(id)),
            }
        };

        let mut builder = Self::builder();
        for x in &input.node {
            builder.add_node(Node::from(x));
        }
        for x in &input.line {
            builder.add_branch(Branch::line(x, node_u(x.from_node)?, node_u(x.to_node)?, config.system_frequency)?);
        }
        for x in &input.link {
            builder.add_branch(Branch::link(x, node_u(x.from_node)?, node_u(x.to_node)?)?);
        }
        for x in &input.transformer {
            builder.add_branch(Branch::transformer(x, node_u(x.from_node)?, node_u(x.to_node)?)?);
        }
        for x in &input.three_winding_transformer {
            let u = [node_u(x.node_1)?, node_u(x.node_2)?, node_u(x.node_3)?];
            builder.add_branch3(Branch3::new(x, u)?);
        }
        for x in &input.source {
            builder.add_source(Source::new(x, node_u(x.node)?));
        }
        for (loads, direction) in [(&input.sym_load, PowerDirection::Load), (&input.sym_gen, PowerDirection::Generator)] {
            for x in loads {
                builder.add_load_gen(LoadGen::sym(x, direction, node_u(x.node)?));
            }
        }
        for (loads, direction) in [(&input.asym_load, PowerDirection::Load), (&input.asym_gen, PowerDirection::Generator)] {
            for x in loads {
                builder.add_load_gen(LoadGen::asym(x, direction, node_u(x.node)?));
            }
        }
        for x in &input.shunt {
            builder.add_shunt(Shunt::new(x, node_u(x.node)?));
        }
        for x in &input.sym_voltage_sensor {
            builder.add_voltage_sensor(VoltageSensor::sym(x, node_u(x.measured_object)?));
        }
        for x in &input.asym_voltage_sensor {
            builder.add_voltage_sensor(VoltageSensor::asym(x, node_u(x.measured_object)?));
        }
        let measured_exists = |id: ID| {
            if kinds.contains_key(&id) {
                Ok(())
            } else {
                Err(ConstructionError::IdNotFound(id))
            }
        };
        for x in &input.sym_power_sensor {
            measured_exists(x.measured_object)?;
            builder.add_power_sensor(PowerSensor::sym(x));
        }
        for x in &input.asym_power_sensor {
            measured_exists(x.measured_object)?;
            builder.add_power_sensor(PowerSensor::asym(x));
        }
        for x in &input.fault {
            builder.add_fault(Fault::new(x, node_u(x.fault_object)?)?);
        }
        builder.finish()
    }

    /// Parses a [`GridInput`] document and builds the container from it.
    pub fn from_json(json: &str, config: &CalculationConfig) -> Result<Self, InputError> {
        let input: GridInput = serde_json::from_str(json)?;
        Ok(Self::from_input(&input, config)?)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn branches_of(&self, kind: BranchKind) -> &[Branch] {
        &self.branches[self.offsets.branch.range(kind)]
    }

    pub fn branch3s(&self) -> &[Branch3] {
        &self.branch3s
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn load_gens(&self) -> &[LoadGen] {
        &self.load_gens
    }

    pub fn load_gens_of(&self, kind: LoadGenKind) -> &[LoadGen] {
        &self.load_gens[self.offsets.load_gen.range(kind)]
    }

    pub fn shunts(&self) -> &[Shunt] {
        &self.shunts
    }

    pub fn voltage_sensors(&self) -> &[VoltageSensor] {
        &self.voltage_sensors
    }

    pub fn voltage_sensors_of(&self, kind: SensorKind) -> &[VoltageSensor] {
        &self.voltage_sensors[self.offsets.voltage_sensor.range(kind)]
    }

    pub fn power_sensors(&self) -> &[PowerSensor] {
        &self.power_sensors
    }

    pub fn power_sensors_of(&self, kind: SensorKind) -> &[PowerSensor] {
        &self.power_sensors[self.offsets.power_sensor.range(kind)]
    }

    pub fn faults(&self) -> &[Fault] {
        &self.faults
    }

    pub fn offsets(&self) -> &SequenceOffsets {
        &self.offsets
    }

    /// Total number of appliances: sources, loads/generators and shunts.
    pub fn appliance_count(&self) -> usize {
        self.sources.len() + self.load_gens.len() + self.shunts.len()
    }

    pub fn get_idx(&self, id: ID) -> ConstructionResult<ComponentIdx> {
        self.id_map.get(&id).copied().ok_or(ConstructionError::IdNotFound(id))
    }

    /// Position of a node by id.
    pub fn node_idx(&self, id: ID) -> ConstructionResult<usize> {
        match self.get_idx(id)? {
            ComponentIdx {
                kind: ComponentKind::Node,
                idx,
            } => Ok(idx),
            _ => Err(ConstructionError::IdWrongType(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> GridInput {
        serde_json::from_str(
            r#"{
                "node": [{"id": 1, "u_rated": 10e3}, {"id": 2, "u_rated": 10e3}, {"id": 3, "u_rated": 0.4e3}],
                "link": [{"id": 10, "from_node": 1, "to_node": 3, "from_status": true, "to_status": true}],
                "line": [{"id": 11, "from_node": 1, "to_node": 2, "from_status": true, "to_status": true,
                          "r1": 0.3, "x1": 0.4, "c1": 1e-6, "tan1": 0.0, "r0": 0.3, "x0": 0.4, "c0": 1e-6, "tan0": 0.0, "i_n": 100.0}],
                "source": [{"id": 20, "node": 1, "status": true, "u_ref": 1.0}],
                "sym_load": [{"id": 30, "node": 2, "status": true, "p_specified": 1e5, "q_specified": 0.0}],
                "sym_gen": [{"id": 31, "node": 3, "status": true, "p_specified": 1e4, "q_specified": 0.0}],
                "asym_load": [{"id": 32, "node": 2, "status": true, "p_specified": [1e4, 1e4, 1e4], "q_specified": [0.0, 0.0, 0.0]}],
                "shunt": [{"id": 40, "node": 2, "status": true, "g1": 0.0, "b1": 1e-3}],
                "sym_voltage_sensor": [{"id": 50, "measured_object": 2, "u_sigma": 1.0, "u_measured": 10e3}],
                "sym_power_sensor": [{"id": 60, "measured_object": 11, "measured_terminal_type": 0, "power_sigma": 1.0, "p_measured": 1e5, "q_measured": 0.0}]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn canonical_order_and_offsets() {
        let c = ComponentContainer::from_input(&input(), &CalculationConfig::default()).unwrap();
        // lines are stored before links
        assert_eq!(c.branches()[0].id(), 11);
        assert_eq!(c.branches()[1].id(), 10);
        assert_eq!(c.offsets().branch.offset(BranchKind::Link), 1);
        assert_eq!(c.offsets().branch.offset(BranchKind::Transformer), 2);
        assert_eq!(c.offsets().branch.total(), 2);
        assert_eq!(c.branches_of(BranchKind::Link)[0].id(), 10);

        let ids: Vec<ID> = c.load_gens().iter().map(LoadGen::id).collect();
        assert_eq!(ids, vec![31, 30, 32]);
        assert_eq!(c.offsets().load_gen.offset(LoadGenKind::SymLoad), 1);
        assert_eq!(c.offsets().load_gen.count(LoadGenKind::AsymGen), 0);
        assert_eq!(c.load_gens_of(LoadGenKind::AsymLoad)[0].id(), 32);
        assert_eq!(c.appliance_count(), 5);

        assert_eq!(
            c.get_idx(10),
            Ok(ComponentIdx {
                kind: ComponentKind::Branch(BranchKind::Link),
                idx: 1
            })
        );
        assert_eq!(c.node_idx(3), Ok(2));
        assert_eq!(c.node_idx(10), Err(ConstructionError::IdWrongType(10)));
        assert_eq!(c.get_idx(99), Err(ConstructionError::IdNotFound(99)));
    }

    #[test]
    fn offsets_are_prefix_counts() {
        use LoadGenKind::*;
        let offsets = CategoryOffsets::from_kinds([AsymLoad, SymGen, SymLoad, SymGen, AsymLoad]);
        for pair in LoadGenKind::ALL.windows(2) {
            assert_eq!(offsets.offset(pair[1]), offsets.offset(pair[0]) + offsets.count(pair[0]));
        }
        assert_eq!(offsets.range(AsymLoad), 3..5);
        assert_eq!(offsets.total(), 5);
        assert_eq!(CategoryOffsets::<SensorKind>::default().total(), 0);
    }

    #[test]
    fn invalid_references() {
        let mut conflict = input();
        conflict.node.push(NodeInput { id: 20, u_rated: 1e3 });
        assert_eq!(
            ComponentContainer::from_input(&conflict, &CalculationConfig::default()),
            Err(ConstructionError::ConflictId(20))
        );

        let mut missing = input();
        missing.shunt[0].node = 7;
        assert_eq!(
            ComponentContainer::from_input(&missing, &CalculationConfig::default()),
            Err(ConstructionError::IdNotFound(7))
        );

        let mut wrong = input();
        wrong.sym_voltage_sensor[0].measured_object = 11;
        assert_eq!(
            ComponentContainer::from_input(&wrong, &CalculationConfig::default()),
            Err(ConstructionError::IdWrongType(11))
        );

        let mut same = input();
        same.link[0].to_node = 1;
        assert_eq!(
            ComponentContainer::from_input(&same, &CalculationConfig::default()),
            Err(ConstructionError::InvalidBranch { id: 10, node: 1 })
        );
    }

    #[test]
    fn json_input_errors_are_typed() {
        let config = CalculationConfig::default();
        let err = ComponentContainer::from_json(r#"{"node": [{"id": 1}]}"#, &config).unwrap_err();
        assert!(matches!(err, InputError::Json(_)));
        let err = ComponentContainer::from_json("{\"node\": [", &config).unwrap_err();
        assert!(matches!(err, InputError::Json(_)));

        let err = ComponentContainer::from_json(
            r#"{"node": [{"id": 1, "u_rated": 10e3}, {"id": 1, "u_rated": 10e3}]}"#,
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, InputError::Construction(ConstructionError::ConflictId(1))));
    }

    #[test]
    fn builder_sorts_any_insertion_order() {
        let sensor = |id: ID| {
            PowerSensor::sym(&SymPowerSensorInput {
                id,
                measured_object: 1,
                measured_terminal_type: 9,
                power_sigma: 1.0,
                p_measured: 0.0,
                q_measured: 0.0,
            })
        };
        let asym = PowerSensor::asym(&AsymPowerSensorInput {
            id: 3,
            measured_object: 1,
            measured_terminal_type: 9,
            power_sigma: 1.0,
            p_measured: [0.0; 3],
            q_measured: [0.0; 3],
        });
        let mut builder = ComponentContainer::builder();
        builder.add_power_sensor(asym).add_power_sensor(sensor(1)).add_power_sensor(sensor(2));
        let c = builder.finish().unwrap();
        let ids: Vec<ID> = c.power_sensors().iter().map(PowerSensor::id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(c.power_sensors_of(SensorKind::Asym).len(), 1);
        assert_eq!(c.offsets().power_sensor.offset(SensorKind::Asym), 2);
    }
}
