//! Rotation Circuit
//!
//! PLONK circuit for the rotation relation. Layout:
//!
//! ```text
//! advice[0..3]  Poseidon state, witnessed words, MAC values
//! advice[1]     MAC inverse (non-zero gate)
//! advice[3]     Poseidon partial S-box
//! instance      [gameId, currentKey, newKey, out.gameId, out.newKey, out.fingerprint]
//! ```
//!
//! Thirteen Poseidon permutations (three serial hashes of six words, one
//! fingerprint hash of seven values) fit comfortably in 2^11 rows.

use ff::Field;
use halo2_gadgets::poseidon::{
    primitives::{ConstantLength, P128Pow5T3},
    Hash as PoseidonHash, Pow5Chip, Pow5Config,
};
use halo2_proofs::{
    circuit::{AssignedCell, Layouter, SimpleFloorPlanner, Value},
    plonk::{Advice, Circuit, Column, ConstraintSystem, Error, Expression, Instance, Selector},
    poly::Rotation,
};
use pasta_curves::Fp;

use crate::core::hash::{POSEIDON_RATE, POSEIDON_WIDTH, SERIAL_HASH_INPUTS};
use crate::identity::fingerprint::FINGERPRINT_ARITY;

use super::public_inputs::{
    GAME_ID_ROW, NEW_KEY_ROW, OUT_FINGERPRINT_ROW, OUT_GAME_ID_ROW, OUT_NEW_KEY_ROW,
};
use super::relation::RotationWitness;

/// log2 of the circuit's row count.
pub const CIRCUIT_K: u32 = 11;

type Cell = AssignedCell<Fp, Fp>;
type Poseidon = Pow5Chip<Fp, POSEIDON_WIDTH, POSEIDON_RATE>;

/// Column and gate configuration.
#[derive(Clone, Debug)]
pub struct RotationCircuitConfig {
    advice: [Column<Advice>; 4],
    instance: Column<Instance>,
    nonzero: Selector,
    poseidon: Pow5Config<Fp, POSEIDON_WIDTH, POSEIDON_RATE>,
}

/// The rotation circuit. Public values come from the instance column only.
#[derive(Clone, Debug)]
pub struct RotationCircuit {
    witness: Value<RotationWitness>,
}

impl RotationCircuit {
    /// Circuit with a known witness, for proving.
    pub fn new(witness: RotationWitness) -> Self {
        Self { witness: Value::known(witness) }
    }
}

impl Default for RotationCircuit {
    fn default() -> Self {
        Self { witness: Value::unknown() }
    }
}

impl Circuit<Fp> for RotationCircuit {
    type Config = RotationCircuitConfig;
    type FloorPlanner = SimpleFloorPlanner;

    fn without_witnesses(&self) -> Self {
        Self::default()
    }

    fn configure(meta: &mut ConstraintSystem<Fp>) -> Self::Config {
        let advice = [
            meta.advice_column(),
            meta.advice_column(),
            meta.advice_column(),
            meta.advice_column(),
        ];
        let instance = meta.instance_column();
        meta.enable_equality(instance);
        for column in advice {
            meta.enable_equality(column);
        }

        let rc_a = [meta.fixed_column(), meta.fixed_column(), meta.fixed_column()];
        let rc_b = [meta.fixed_column(), meta.fixed_column(), meta.fixed_column()];
        // ConstantLength padding is loaded from a fixed column
        meta.enable_constant(rc_b[0]);

        let poseidon = Poseidon::configure::<P128Pow5T3>(
            meta,
            [advice[0], advice[1], advice[2]],
            advice[3],
            rc_a,
            rc_b,
        );

        let nonzero = meta.selector();
        meta.create_gate("value is non-zero", |meta| {
            let s = meta.query_selector(nonzero);
            let value = meta.query_advice(advice[0], Rotation::cur());
            let inverse = meta.query_advice(advice[1], Rotation::cur());
            vec![s * (value * inverse - Expression::Constant(Fp::ONE))]
        });

        RotationCircuitConfig { advice, instance, nonzero, poseidon }
    }

    fn synthesize(&self, config: Self::Config, mut layouter: impl Layouter<Fp>) -> Result<(), Error> {
        let w = self.witness;

        // currentSessionKey (row 1) is bound by the instance alone
        let (game_id, new_key) = layouter.assign_region(
            || "public inputs",
            |mut region| {
                let game_id = region.assign_advice_from_instance(
                    || "game id",
                    config.instance,
                    GAME_ID_ROW,
                    config.advice[0],
                    0,
                )?;
                let new_key = region.assign_advice_from_instance(
                    || "new session key",
                    config.instance,
                    NEW_KEY_ROW,
                    config.advice[1],
                    0,
                )?;
                Ok((game_id, new_key))
            },
        )?;

        let cpu_id = assign_private(&config, &mut layouter, "cpu id", w.map(|w| w.cpu_id))?;
        let system_uuid =
            assign_private(&config, &mut layouter, "system uuid", w.map(|w| w.system_uuid))?;
        let mac_primary =
            assign_nonzero(&config, &mut layouter, "mac primary", w.map(|w| w.mac_primary))?;
        let mac_secondary =
            assign_nonzero(&config, &mut layouter, "mac secondary", w.map(|w| w.mac_secondary))?;

        let system_serial =
            hash_serial(&config, &mut layouter, "system serial", w.map(|w| w.system_serial))?;
        let baseboard_serial =
            hash_serial(&config, &mut layouter, "baseboard serial", w.map(|w| w.baseboard_serial))?;
        let disk_serial =
            hash_serial(&config, &mut layouter, "disk serial", w.map(|w| w.disk_serial))?;

        let message: [Cell; FINGERPRINT_ARITY] = [
            cpu_id,
            system_serial,
            system_uuid,
            baseboard_serial,
            mac_primary,
            mac_secondary,
            disk_serial,
        ];
        let hasher = PoseidonHash::<_, _, P128Pow5T3, ConstantLength<FINGERPRINT_ARITY>, POSEIDON_WIDTH, POSEIDON_RATE>::init(
            Poseidon::construct(config.poseidon.clone()),
            layouter.namespace(|| "fingerprint init"),
        )?;
        let fingerprint = hasher.hash(layouter.namespace(|| "fingerprint"), message)?;

        layouter.constrain_instance(game_id.cell(), config.instance, OUT_GAME_ID_ROW)?;
        layouter.constrain_instance(new_key.cell(), config.instance, OUT_NEW_KEY_ROW)?;
        layouter.constrain_instance(fingerprint.cell(), config.instance, OUT_FINGERPRINT_ROW)?;

        Ok(())
    }
}

fn assign_private(
    config: &RotationCircuitConfig,
    layouter: &mut impl Layouter<Fp>,
    name: &'static str,
    value: Value<Fp>,
) -> Result<Cell, Error> {
    layouter.assign_region(
        || name,
        |mut region| region.assign_advice(|| name, config.advice[0], 0, || value),
    )
}

/// Witness `value` together with its inverse; the gate fails for zero.
fn assign_nonzero(
    config: &RotationCircuitConfig,
    layouter: &mut impl Layouter<Fp>,
    name: &'static str,
    value: Value<Fp>,
) -> Result<Cell, Error> {
    layouter.assign_region(
        || name,
        |mut region| {
            config.nonzero.enable(&mut region, 0)?;
            let cell = region.assign_advice(|| name, config.advice[0], 0, || value)?;
            region.assign_advice(
                || "inverse",
                config.advice[1],
                0,
                || value.map(|v| v.invert().unwrap_or(Fp::ZERO)),
            )?;
            Ok(cell)
        },
    )
}

/// Witness a packed serial and hash it in-circuit.
fn hash_serial(
    config: &RotationCircuitConfig,
    layouter: &mut impl Layouter<Fp>,
    name: &'static str,
    words: Value<[Fp; SERIAL_HASH_INPUTS]>,
) -> Result<Cell, Error> {
    let cells = layouter.assign_region(
        || name,
        |mut region| {
            (0..SERIAL_HASH_INPUTS)
                .map(|i| {
                    region.assign_advice(
                        || format!("{} word {}", name, i),
                        config.advice[0],
                        i,
                        || words.map(|w| w[i]),
                    )
                })
                .collect::<Result<Vec<_>, Error>>()
        },
    )?;
    let message: [Cell; SERIAL_HASH_INPUTS] = cells.try_into().map_err(|_| Error::Synthesis)?;

    let hasher = PoseidonHash::<_, _, P128Pow5T3, ConstantLength<SERIAL_HASH_INPUTS>, POSEIDON_WIDTH, POSEIDON_RATE>::init(
        Poseidon::construct(config.poseidon.clone()),
        layouter.namespace(|| format!("{} init", name)),
    )?;
    hasher.hash(layouter.namespace(|| format!("{} hash", name)), message)
}

// =============================================================================
// TESTS
// =============================================================================
