//! Audio output device and MIDI input port listing.

use polywave_io::{default_output_device, list_devices, list_midi_ports};

pub fn run() -> anyhow::Result<()> {
    let devices = list_devices()?;
    let default_name = default_output_device()?.map(|d| d.name);

    println!("Output Devices");
    println!("==============\n");
    if devices.is_empty() {
        println!("  (none found)");
    }
    for (idx, device) in devices.iter().enumerate() {
        let marker = if default_name.as_deref() == Some(device.name.as_str()) {
            " [default]"
        } else {
            ""
        };
        println!(
            "  [{}] {} ({} Hz, {} ch){}",
            idx, device.name, device.default_sample_rate, device.channels, marker
        );
    }
    println!();

    println!("MIDI Input Ports");
    println!("================\n");
    match list_midi_ports() {
        Ok(ports) if ports.is_empty() => println!("  (none found)"),
        Ok(ports) => {
            for (idx, port) in ports.iter().enumerate() {
                println!("  [{}] {}", idx, port);
            }
        }
        Err(e) => println!("  MIDI unavailable: {}", e),
    }
    println!();

    println!("Tip: Use an index or partial name with --output/--midi:");
    println!("  polywave play --output 0 --midi 0");
    Ok(())
}
