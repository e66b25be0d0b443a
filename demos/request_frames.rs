//! Print the frames of the calibration requests and of a 5° wind angle
//! offset command, in the diagnostic line format accepted by most USB-CAN
//! adapters.
//!
//! ```text
//! cargo run --example request_frames
//! ```
use n2k_calib::protocol::group_function::{GroupFunctionBuilder, GroupFunctionConfig};
use n2k_calib::protocol::messages::schema::BuiltinSchema;
use n2k_calib::protocol::messages::{PgnMessage, MHU_CALIBRATION, SPEED_CALIBRATION};

fn print_frames(label: &str, message: &PgnMessage) -> Result<(), String> {
    println!("# {label} (PGN {}, {} bytes)", message.pgn(), message.payload().len());
    for frame in message.frames().map_err(|e| e.to_string())? {
        print!("{frame}");
    }
    Ok(())
}

fn main() -> Result<(), String> {
    let schema = BuiltinSchema;
    let builder = GroupFunctionBuilder::new(
        &schema,
        GroupFunctionConfig {
            source_address: 0x10,
            ..GroupFunctionConfig::default()
        },
    );

    for pgn in [MHU_CALIBRATION, SPEED_CALIBRATION] {
        let request = builder.build_request(pgn).map_err(|e| e.to_string())?;
        print_frames("request", &request)?;
    }

    let command = builder
        .build_command(MHU_CALIBRATION, 0x23, 3, 5.0_f64.to_radians())
        .map_err(|e| e.to_string())?;
    print_frames("AWA offset 5 deg to 0x23", &command)?;

    let reset = builder
        .build_reset(MHU_CALIBRATION, 0x23, 3)
        .map_err(|e| e.to_string())?;
    print_frames("AWA offset reset", &reset)?;
    Ok(())
}
