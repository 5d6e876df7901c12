/*! Decode a captured KNX TP1 bus-level sample file.

```no_run
$ knxdecode -r capture.u8 --sample-rate 192000
[…]
```
*/
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use knx_tp1::blocks::{FileSource, KnxTp1Decoder};
use knx_tp1::config::{DecoderConfig, Polarity};
use knx_tp1::graph::{Graph, GraphRunner};

#[derive(clap::Parser, Debug)]
#[command(version, about)]
struct Opt {
    /// Capture file: one byte per sample, `0` or nonzero for the
    /// logic level.
    #[arg(short, long = "read")]
    read: PathBuf,

    /// Sample rate of the capture, in Hz.
    #[arg(long = "sample-rate")]
    sample_rate: u32,

    /// Bus is idle-low instead of the usual idle-high.
    #[arg(long)]
    inverted: bool,

    /// Loop the capture file instead of stopping at EOF.
    #[arg(long)]
    repeat: bool,

    #[arg(short, default_value = "0")]
    verbose: usize,
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    stderrlog::new()
        .module(module_path!())
        .module("knx_tp1")
        .quiet(false)
        .verbosity(opt.verbose)
        .timestamp(stderrlog::Timestamp::Second)
        .init()?;

    let polarity = if opt.inverted {
        Polarity::Inverted
    } else {
        Polarity::Normal
    };
    let cfg = DecoderConfig::new(opt.sample_rate, polarity)?;

    let mut g = Graph::new();
    let (src, src_out) = FileSource::new(opt.read.to_str().unwrap(), opt.repeat)?;
    let (dec, annotations) = KnxTp1Decoder::new(src_out, cfg);
    g.add(Box::new(src));
    g.add(Box::new(dec));

    let cancel = g.cancel_token();
    ctrlc::set_handler(move || {
        eprintln!("Received Ctrl+C!");
        cancel.cancel();
    })?;

    g.run()?;

    while let Some((annotation, _tags)) = annotations.pop() {
        println!(
            "[{}, {}) {}: {}",
            annotation.range.ss,
            annotation.range.se,
            annotation.tag.row(),
            annotation.text[0],
        );
    }

    Ok(())
}
