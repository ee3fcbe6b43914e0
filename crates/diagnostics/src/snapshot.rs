//! ASCII snapshots of the full particle set
//!
//! Layout, one record per line, tab separated:
//!
//! ```text
//! n_global  id_next  time
//! ekin  ephi_sun  ephi_planet  ephi_d  etot  edisp  edisp_gd      (initial)
//! ekin  ephi_sun  ephi_planet  ephi_d  etot  edisp  edisp_gd      (current)
//! id  mass  x  y  z  vx  vy  vz  neighbor  time                   (per particle)
//! ```
//!
//! Floating point values use [`sci15`]. Particles appear in rank order.

use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use comm::{Communicator, GatherLayout};
use nalgebra::{Point3, Vector3};
use nbody::format::sci15;
use nbody::{Energy, Particle, ParticleId, ParticleView};
use serde::{Deserialize, Serialize};

use crate::error::OutputError;

/// Snapshot header
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FileHeader {
    pub n_global: usize,
    /// Next id the run will hand out
    pub id_next: u64,
    pub time: f64,
    pub e_init: Energy,
    pub e_now: Energy,
}

impl FileHeader {
    /// Header whose particle count is filled in when the snapshot is taken
    pub fn new(time: f64, id_next: u64, e_init: Energy, e_now: Energy) -> Self {
        Self {
            n_global: 0,
            id_next,
            time,
            e_init,
            e_now,
        }
    }
}

/// A snapshot read back from disk
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub header: FileHeader,
    pub particles: Vec<Particle>,
}

/// Where a snapshot goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotTarget {
    pub dir: PathBuf,
    pub index: u64,
}

impl SnapshotTarget {
    pub fn path(&self) -> PathBuf {
        snapshot_path(&self.dir, self.index)
    }
}

/// `<dir>/snapNNNNNN.dat`
///
/// # Examples
///
/// ```
/// use diagnostics::snapshot_path;
/// use std::path::Path;
///
/// assert_eq!(snapshot_path(Path::new("out"), 42), Path::new("out/snap000042.dat"));
/// ```
pub fn snapshot_path(dir: &Path, isnap: u64) -> PathBuf {
    dir.join(format!("snap{:06}.dat", isnap))
}

fn energy_line(e: &Energy) -> String {
    [e.ekin, e.ephi_sun, e.ephi_planet, e.ephi_d, e.etot, e.edisp, e.edisp_gd]
        .iter()
        .map(|&v| sci15(v))
        .collect::<Vec<_>>()
        .join("\t")
}

fn particle_line(p: &Particle) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        p.id,
        sci15(p.mass),
        sci15(p.position.x),
        sci15(p.position.y),
        sci15(p.position.z),
        sci15(p.velocity.x),
        sci15(p.velocity.y),
        sci15(p.velocity.z),
        p.neighbor,
        sci15(p.time),
    )
}

/// Writes a complete snapshot to `out`
pub fn write_snapshot<W: Write>(
    out: &mut W,
    header: &FileHeader,
    particles: &[Particle],
) -> Result<(), OutputError> {
    writeln!(out, "{}\t{}\t{}", header.n_global, header.id_next, sci15(header.time))?;
    writeln!(out, "{}", energy_line(&header.e_init))?;
    writeln!(out, "{}", energy_line(&header.e_now))?;
    for p in particles {
        writeln!(out, "{}", particle_line(p))?;
    }
    Ok(())
}

/// Gathers every rank's particles on the root and writes them (collective)
///
/// `header.n_global` is overwritten with the gathered count. Returns the
/// written path on the root and `None` elsewhere. A write failure on the
/// root is reported on every rank.
pub fn make_snapshot<V, C>(
    view: &V,
    mut header: FileHeader,
    target: &SnapshotTarget,
    comm: &C,
) -> Result<Option<PathBuf>, OutputError>
where
    V: ParticleView,
    C: Communicator,
{
    let local = view.particles().to_vec();
    let layout = comm.gather_usize(local.len()).map(GatherLayout::from_counts);
    let gathered = comm.gather_varying(local, layout.as_ref());

    let written = match gathered {
        Some(particles) => {
            header.n_global = particles.len();
            write_file(target, &header, &particles).map(Some)
        }
        None => Ok(None),
    };

    let failed_ranks = comm.sum_usize(usize::from(written.is_err()));
    let path = written?;
    if failed_ranks > 0 {
        return Err(OutputError::PeerFailure { failed_ranks });
    }
    Ok(path)
}

fn write_file(
    target: &SnapshotTarget,
    header: &FileHeader,
    particles: &[Particle],
) -> Result<PathBuf, OutputError> {
    fs::create_dir_all(&target.dir)?;
    let path = target.path();
    let mut out = BufWriter::new(File::create(&path)?);
    write_snapshot(&mut out, header, particles)?;
    out.flush()?;

    tracing::info!(path = %path.display(), n = particles.len(), "wrote snapshot");
    Ok(path)
}

fn parse_error(line: usize, message: impl Into<String>) -> OutputError {
    OutputError::Parse {
        line,
        message: message.into(),
    }
}

/// Splits a record into exactly `expected` fields
fn fields(text: &str, line: usize, expected: usize) -> Result<Vec<&str>, OutputError> {
    let fields: Vec<&str> = text.split('\t').collect();
    if fields.len() != expected {
        return Err(parse_error(
            line,
            format!("expected {} fields, found {}", expected, fields.len()),
        ));
    }
    Ok(fields)
}

fn parse<T: FromStr>(field: &str, line: usize, name: &str) -> Result<T, OutputError> {
    field
        .trim()
        .parse()
        .map_err(|_| parse_error(line, format!("bad {name}: {field:?}")))
}

fn parse_energy(text: &str, line: usize) -> Result<Energy, OutputError> {
    let f = fields(text, line, 7)?;
    Ok(Energy {
        ekin: parse(f[0], line, "ekin")?,
        ephi_sun: parse(f[1], line, "ephi_sun")?,
        ephi_planet: parse(f[2], line, "ephi_planet")?,
        ephi_d: parse(f[3], line, "ephi_d")?,
        etot: parse(f[4], line, "etot")?,
        edisp: parse(f[5], line, "edisp")?,
        edisp_gd: parse(f[6], line, "edisp_gd")?,
    })
}

fn parse_particle(text: &str, line: usize) -> Result<Particle, OutputError> {
    let f = fields(text, line, 10)?;
    let coords = |offset: usize, name: &str| -> Result<[f64; 3], OutputError> {
        Ok([
            parse(f[offset], line, name)?,
            parse(f[offset + 1], line, name)?,
            parse(f[offset + 2], line, name)?,
        ])
    };
    let [x, y, z] = coords(2, "position")?;
    let [vx, vy, vz] = coords(5, "velocity")?;

    let mut p = Particle::new(
        ParticleId(parse(f[0], line, "id")?),
        parse(f[1], line, "mass")?,
        Point3::new(x, y, z),
        Vector3::new(vx, vy, vz),
    );
    p.neighbor = parse(f[8], line, "neighbor")?;
    p.time = parse(f[9], line, "time")?;
    Ok(p)
}

/// Reads a snapshot written by [`write_snapshot`]
///
/// Line numbers in errors are 1-based.
pub fn read_snapshot<R: BufRead>(reader: R) -> Result<Snapshot, OutputError> {
    let mut lines = reader.lines().enumerate().map(|(i, text)| (i + 1, text));
    let mut next_line = |what: &str| -> Result<(usize, String), OutputError> {
        match lines.next() {
            Some((line, text)) => Ok((line, text?)),
            None => Err(parse_error(0, format!("missing {what}"))),
        }
    };

    let (line, text) = next_line("header")?;
    let f = fields(&text, line, 3)?;
    let n_global: usize = parse(f[0], line, "n_global")?;
    let id_next = parse(f[1], line, "id_next")?;
    let time = parse(f[2], line, "time")?;

    let (line, text) = next_line("initial energy")?;
    let e_init = parse_energy(&text, line)?;
    let (line, text) = next_line("current energy")?;
    let e_now = parse_energy(&text, line)?;

    let mut particles = Vec::new();
    for (line, text) in lines {
        let text = text?;
        if text.trim().is_empty() {
            continue;
        }
        particles.push(parse_particle(&text, line)?);
    }

    if particles.len() != n_global {
        return Err(parse_error(
            0,
            format!("header announces {} particles, found {}", n_global, particles.len()),
        ));
    }

    Ok(Snapshot {
        header: FileHeader {
            n_global,
            id_next,
            time,
            e_init,
            e_now,
        },
        particles,
    })
}
