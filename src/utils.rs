use crate::types::{Axis, ChannelKind, Quaternion};
use cgmath::{Deg, One, Rotation3};

/// Rotation of `degrees` about a single axis.
pub(crate) fn __axis_rotation(axis: Axis, degrees: f64) -> Quaternion {
    match axis {
        Axis::X => Quaternion::from_angle_x(Deg(degrees)),
        Axis::Y => Quaternion::from_angle_y(Deg(degrees)),
        Axis::Z => Quaternion::from_angle_z(Deg(degrees)),
    }
}

/// Build a joint's local rotation from its channels and their values (angles in DEGREES).
///
/// Channels and values are paired in declared order; position channels are skipped.
/// The single-axis rotations are multiplied in declared order, so the last declared
/// channel is the innermost one (applied to a vector first): ZXY gives `Rz * Rx * Ry`.
pub fn channels_to_quat<'a>(
    channels: impl IntoIterator<Item = &'a ChannelKind>,
    values: &[f64],
) -> Quaternion {
    channels
        .into_iter()
        .zip(values)
        .filter(|(channel, _)| channel.is_rotation())
        .fold(Quaternion::one(), |acc, (channel, &degrees)| {
            acc * __axis_rotation(channel.axis(), degrees)
        })
}

/// Shortest text that parses back to exactly `value`. Never uses exponent notation.
pub(crate) fn __format_exact(value: f64) -> String {
    format!("{}", value)
}

/// `value` with a fixed number of decimals, or the exact form when `precision` is `None`.
pub(crate) fn __format_number(value: f64, precision: Option<usize>) -> String {
    match precision {
        Some(decimals) => format!("{:.*}", decimals, value),
        None => __format_exact(value),
    }
}
