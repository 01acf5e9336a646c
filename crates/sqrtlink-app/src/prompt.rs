use std::io::{self, BufRead, Write};

use anyhow::{bail, Result};

use sqrtlink_codec::{DeviceResponse, MAX_OPERAND};
use sqrtlink_core::{BusTransport, DeviceSession, DigitalOutput, Direction};

pub const PROMPT: &str = "Enter a number to calculate SQRT (0 to exit): ";

const NOT_A_NUMBER: &str = "Please enter a valid number.";
const NEGATIVE: &str = "Please enter a positive number.";
const TOO_LARGE: &str = "Number is too large for the peripheral (max 65535.99998).";

/// One line of user input, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Exit,
    Operand(f64),
    Invalid(&'static str),
}

pub fn parse_entry(input: &str) -> Entry {
    let input = input.trim();
    if input == "0" {
        return Entry::Exit;
    }
    let value: f64 = match input.parse() {
        Ok(v) => v,
        Err(_) => return Entry::Invalid(NOT_A_NUMBER),
    };
    if !value.is_finite() {
        return Entry::Invalid(NOT_A_NUMBER);
    }
    if value == 0.0 {
        return Entry::Exit;
    }
    if value < 0.0 {
        return Entry::Invalid(NEGATIVE);
    }
    if value > MAX_OPERAND {
        return Entry::Invalid(TOO_LARGE);
    }
    Entry::Operand(value)
}

/// Run one request and print the raw read response and the result.
///
/// A failed request is reported on `out` and is not an error for the caller.
pub fn submit_and_report<B, P, W>(
    session: &mut DeviceSession<B, P>,
    operand: f64,
    out: &mut W,
) -> io::Result<bool>
where
    B: BusTransport,
    P: DigitalOutput,
    W: Write,
{
    match session.submit(operand) {
        Ok(root) => {
            if let Some(rx) = session.frame_log().last(Direction::Rx) {
                writeln!(out, "SPI packet return: {}", hex::encode_upper(&rx.data))?;
                if let Ok(response) = DeviceResponse::new(rx.data.clone()) {
                    if let Ok(json) = serde_json::to_string(&response) {
                        log::debug!("response {json}");
                    }
                }
            }
            writeln!(out, "Root is: {root:.2}")?;
            Ok(true)
        }
        Err(e) => {
            writeln!(out, "Request failed: {e}")?;
            Ok(false)
        }
    }
}

/// Handle a single value given on the command line.
///
/// Zero exits without a request. Invalid input and failed requests are errors.
pub fn run_once<B, P, W>(session: &mut DeviceSession<B, P>, value: &str, out: &mut W) -> Result<()>
where
    B: BusTransport,
    P: DigitalOutput,
    W: Write,
{
    match parse_entry(value) {
        Entry::Exit => Ok(()),
        Entry::Invalid(msg) => bail!("{msg}"),
        Entry::Operand(v) => {
            if !submit_and_report(session, v, out)? {
                bail!("request for {v} failed");
            }
            Ok(())
        }
    }
}

/// Prompt until the user enters zero or input ends.
pub fn run<B, P, R, W>(session: &mut DeviceSession<B, P>, mut input: R, mut out: W) -> io::Result<()>
where
    B: BusTransport,
    P: DigitalOutput,
    R: BufRead,
    W: Write,
{
    let mut line = String::new();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(());
        }
        match parse_entry(&line) {
            Entry::Exit => return Ok(()),
            Entry::Invalid(msg) => writeln!(out, "{msg}")?,
            Entry::Operand(v) => {
                submit_and_report(session, v, &mut out)?;
            }
        }
    }
}
