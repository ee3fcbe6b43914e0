//! Number formatting shared by the removal log, the energy log and snapshots
//!
//! Scientific values follow the C `printf("%.15e")` layout: a signed,
//! at least two-digit exponent (`1.000000000000000e-01`).

use crate::particle::Particle;

/// Fixed notation with 8 decimals
pub fn fixed8(value: f64) -> String {
    format!("{:.8}", value)
}

/// Scientific notation with 15 decimals and a C-style exponent
///
/// # Examples
///
/// ```
/// use nbody::format::sci15;
///
/// assert_eq!(sci15(0.1), "1.000000000000000e-01");
/// assert_eq!(sci15(-2.5e12), "-2.500000000000000e+12");
/// assert_eq!(sci15(0.0), "0.000000000000000e+00");
/// ```
pub fn sci15(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let rust = format!("{:.15e}", value);
    match rust.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => rust,
    }
}

/// One removal-log line: time, id, mass, position, velocity (tab separated)
pub fn removal_record(p: &Particle) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        fixed8(p.time),
        p.id,
        sci15(p.mass),
        sci15(p.position.x),
        sci15(p.position.y),
        sci15(p.position.z),
        sci15(p.velocity.x),
        sci15(p.velocity.y),
        sci15(p.velocity.z),
    )
}
