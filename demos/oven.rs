use std::env;

use inquire::Select;
use serialport::SerialPort;
use tracer_bench::eurotherm::Eurotherm2404;

// Configuration constants - adjust these for your setup
const BAUD_RATE: u32 = 9600;
// The controller can take a while to respond, a reasonably large time out is required.
const SERIAL_TIMEOUT_MS: u64 = 500;
const DEVICE_ADDRESS: u8 = 0x01;
const SETPOINT_CELSIUS: i64 = 120;

pub struct PortWrapper(Box<dyn SerialPort>);

#[derive(Debug)]
pub struct IoError(std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            std::io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            std::io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            std::io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            std::io::ErrorKind::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for PortWrapper {
    type Error = IoError;
}

impl embedded_io::Read for PortWrapper {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for PortWrapper {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

fn main() {
    env_logger::init();

    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(1).unwrap_or_else(|| {
        // List available serial ports
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        // Interactive selection
        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    println!("Using port: {}", port_name);

    // Open serial port
    let port = serialport::new(&port_name, BAUD_RATE)
        .timeout(std::time::Duration::from_millis(SERIAL_TIMEOUT_MS))
        .open()
        .expect("Failed to open serial port");

    let port = PortWrapper(port);

    // Create an oven controller object
    let mut oven = Eurotherm2404::new(port, DEVICE_ADDRESS);

    // Confirm the link with an echo
    oven.ping(0x1234).expect("Echo test failed");
    println!("Link OK");

    // Read and display the oven state
    let temperature = oven.read_process_temperature().unwrap();
    println!("Oven temperature: {temperature}°C");

    let power = oven.read_output_power().unwrap();
    println!("Output power: {power}%");

    let selected = oven.get_selected_setpoint().unwrap();
    println!("Selected setpoint: SP{}", selected + 1);

    // Set the working setpoint
    oven.set_selected_setpoint_value(SETPOINT_CELSIUS).unwrap();
    println!("Setpoint set to {SETPOINT_CELSIUS}°C");

    // Verify the setting was applied
    let setpoint = oven.read_setpoint1().unwrap();
    println!("Setpoint 1 reads back as {setpoint}°C");
}
