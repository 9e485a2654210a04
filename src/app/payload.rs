//! Message payload parsing shared by the feature modules.

use crate::error::PayloadError;
use crate::gpioex::bank::Actuators;

fn text(payload: &[u8]) -> &str {
    std::str::from_utf8(payload).unwrap_or("").trim()
}

fn invalid(payload: &[u8]) -> PayloadError {
    PayloadError::Invalid(String::from_utf8_lossy(payload).into_owned())
}

/// `on` → `true`, `off` → `false`; anything else is rejected.
pub fn parse_on_off(payload: &[u8]) -> Result<bool, PayloadError> {
    match text(payload) {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err(invalid(payload)),
    }
}

/// Yard watering command: which zones, and engage or release.
///
/// | payload      | zones             | engage |
/// |--------------|-------------------|--------|
/// | `left`       | left              | yes    |
/// | `right`      | right             | yes    |
/// | `middle`     | left + right      | yes    |
/// | `front`      | front             | yes    |
/// | `back`       | back              | yes    |
/// | `front_back` | front + back      | yes    |
/// | `off`        | all four          | no     |
pub fn parse_water(payload: &[u8]) -> Result<(Actuators, bool), PayloadError> {
    let zones = match text(payload) {
        "left" => Actuators::YARD_LEFT,
        "right" => Actuators::YARD_RIGHT,
        "middle" => Actuators::YARD_LEFT | Actuators::YARD_RIGHT,
        "front" => Actuators::YARD_FRONT,
        "back" => Actuators::YARD_BACK,
        "front_back" => Actuators::YARD_FRONT | Actuators::YARD_BACK,
        "off" => return Ok((Actuators::YARD, false)),
        _ => return Err(invalid(payload)),
    };
    Ok((zones, true))
}
