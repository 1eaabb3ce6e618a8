use crate::error::Result;
use crate::fileio::{read_up_to, stream_len};
use crate::instrument::Instrumentation;
use crate::key::KeyBuffer;
use crate::pipeline::chunk::ChunkBuffer;
use crate::pipeline::transform::{Action, BlockTransform};
use crate::tier::KeyTier;
use serde::{Deserialize, Serialize};
use std::io::{Read, Seek, Write};
use std::time::Instant;
use tracing::{debug, trace};

/// Timing of one read-transform-write pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationRecord {
    pub index: u64,
    pub bytes_read: usize,
    pub buffer_capacity: usize,
    pub elapsed_nanos: u64,
    pub elapsed_seconds: f64,
}

/// Cumulative counters for a run; only ever grow
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTotals {
    pub iterations: u64,
    pub bytes_processed: u64,
    pub elapsed_seconds: f64,
}

impl RunTotals {
    pub fn add(&mut self, record: &IterationRecord) {
        self.iterations += 1;
        self.bytes_processed += record.bytes_read as u64;
        self.elapsed_seconds += record.elapsed_seconds;
    }
}

/// Outcome of a stream pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Success,
    Aborted,
}

impl StreamStatus {
    pub fn is_success(self) -> bool {
        self == StreamStatus::Success
    }
}

/// Mutable state of one run, threaded through every stage by reference
pub struct RunContext {
    pub sinks: Instrumentation,
    pub chunk: ChunkBuffer,
    pub totals: RunTotals,
}

impl RunContext {
    pub fn new(sinks: Instrumentation, chunk: ChunkBuffer) -> Self {
        Self {
            sinks,
            chunk,
            totals: RunTotals::default(),
        }
    }
}

/// Drives the chunked read, transform, write loop
pub struct StreamProcessor<T> {
    transform: T,
}

impl<T: BlockTransform> StreamProcessor<T> {
    pub fn new(transform: T) -> Self {
        Self { transform }
    }

    /// Push all of `input` through the transform into `output`.
    ///
    /// An `Invalid` tier aborts before any byte is read or written. Otherwise
    /// every chunk is zeroed, filled, transformed over the full chunk
    /// capacity, timed, reported, and written back trimmed to the bytes read.
    pub fn process<R, W>(
        &self,
        ctx: &mut RunContext,
        action: Action,
        key: &KeyBuffer,
        tier: KeyTier,
        input: &mut R,
        output: &mut W,
    ) -> Result<StreamStatus>
    where
        R: Read + Seek,
        W: Write,
    {
        let Some(bits) = tier.bits() else {
            ctx.sinks.console_and_log("Invalid key size. Aborting...")?;
            return Ok(StreamStatus::Aborted);
        };
        ctx.sinks.log(format_args!("Valid key size - {} bits", bits))?;

        let layout = ctx.chunk.layout();
        let capacity = ctx.chunk.capacity();
        let total_size = stream_len(input)?;
        let iteration_count = layout.iterations_for(total_size);
        debug!(%action, total_size, capacity, iteration_count, "starting stream");

        for index in 0..iteration_count {
            ctx.chunk.reset();
            let bytes_read = read_up_to(input, ctx.chunk.as_mut_slice())?;
            ctx.sinks
                .log(format_args!("iteration {}: read {} bytes", index, bytes_read))?;

            let start = Instant::now();
            self.transform
                .apply(action, ctx.chunk.as_mut_slice(), layout, key, tier)?;
            let elapsed = start.elapsed();

            let record = IterationRecord {
                index,
                bytes_read,
                buffer_capacity: capacity,
                elapsed_nanos: elapsed.as_nanos() as u64,
                elapsed_seconds: elapsed.as_secs_f64(),
            };
            ctx.totals.add(&record);
            ctx.sinks.record(&record)?;
            ctx.sinks.console_and_log(format_args!(
                "iteration {}: processed {} bytes in {:.9} s",
                index, bytes_read, record.elapsed_seconds
            ))?;
            trace!(index, bytes_read, nanos = record.elapsed_nanos, "chunk done");

            output.write_all(&ctx.chunk.as_slice()[..bytes_read])?;
        }
        output.flush()?;

        Ok(StreamStatus::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::testing::SharedBuf;
    use crate::instrument::REPORT_HEADER;
    use crate::key::load_key_from;
    use crate::pipeline::chunk::ChunkLayout;
    use crate::pipeline::transform::TwofishTransform;
    use crate::error::HarnessError;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::io::{self, Cursor, SeekFrom};

    /// Records what the primitive was handed, then flips every byte
    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<Vec<u8>>>,
    }

    impl Recorder {
        fn record(&self, data: &mut [u8], layout: ChunkLayout) -> Result<()> {
            let region = &mut data[..layout.capacity()];
            self.calls.borrow_mut().push(region.to_vec());
            region.iter_mut().for_each(|b| *b = !*b);
            Ok(())
        }
    }

    impl BlockTransform for &Recorder {
        fn encrypt(
            &self,
            data: &mut [u8],
            layout: ChunkLayout,
            _: &KeyBuffer,
            _: KeyTier,
        ) -> Result<()> {
            self.record(data, layout)
        }

        fn decrypt(
            &self,
            data: &mut [u8],
            layout: ChunkLayout,
            _: &KeyBuffer,
            _: KeyTier,
        ) -> Result<()> {
            self.record(data, layout)
        }
    }

    /// Sink whose every write fails
    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("device gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Reports a fixed length but fails every read
    struct BrokenSource {
        len: u64,
    }

    impl Read for BrokenSource {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("bad sector"))
        }
    }

    impl Seek for BrokenSource {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            match pos {
                SeekFrom::End(_) => Ok(self.len),
                _ => Ok(0),
            }
        }
    }

    /// Primitive that rejects every chunk
    struct Refusing;

    impl BlockTransform for Refusing {
        fn encrypt(
            &self,
            _: &mut [u8],
            _: ChunkLayout,
            _: &KeyBuffer,
            _: KeyTier,
        ) -> Result<()> {
            Err(HarnessError::Transform("refused".into()))
        }

        fn decrypt(
            &self,
            _: &mut [u8],
            _: ChunkLayout,
            _: &KeyBuffer,
            _: KeyTier,
        ) -> Result<()> {
            Err(HarnessError::Transform("refused".into()))
        }
    }

    struct Harness {
        ctx: RunContext,
        log: SharedBuf,
        report: SharedBuf,
        console: SharedBuf,
    }

    fn harness(block_count: usize) -> Harness {
        let console = SharedBuf::default();
        let log = SharedBuf::default();
        let report = SharedBuf::default();
        let mut sinks = Instrumentation::new(
            Box::new(console.clone()),
            Box::new(log.clone()),
            Box::new(report.clone()),
        );
        sinks.report_header().unwrap();
        let chunk = ChunkBuffer::new(ChunkLayout::new(block_count).unwrap());
        Harness {
            ctx: RunContext::new(sinks, chunk),
            log,
            report,
            console,
        }
    }

    fn key(len: usize, h: &mut Harness) -> (KeyBuffer, KeyTier) {
        load_key_from(&mut Cursor::new(vec![0x42u8; len]), &mut h.ctx.sinks).unwrap()
    }

    fn report_rows(report: &SharedBuf) -> Vec<Vec<String>> {
        report
            .text()
            .lines()
            .skip_while(|l| *l != REPORT_HEADER)
            .skip(1)
            .map(|l| l.split(',').map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_invalid_tier_aborts_without_io() {
        let mut h = harness(1);
        let (k, tier) = key(40, &mut h);
        assert_eq!(tier, KeyTier::Invalid);

        let mut input = Cursor::new(vec![1u8; 100]);
        let mut output = Vec::new();
        let recorder = Recorder::default();
        let status = StreamProcessor::new(&recorder)
            .process(&mut h.ctx, Action::Encrypt, &k, tier, &mut input, &mut output)
            .unwrap();

        assert_eq!(status, StreamStatus::Aborted);
        assert!(output.is_empty());
        assert_eq!(input.position(), 0);
        assert!(recorder.calls.borrow().is_empty());
        assert_eq!(h.ctx.totals, RunTotals::default());
        assert!(report_rows(&h.report).is_empty());
        assert!(h.log.text().contains("Invalid key size. Aborting..."));
        assert!(h.console.text().contains("Invalid key size. Aborting..."));
    }

    #[test]
    fn test_short_final_chunk_is_padded_for_transform() {
        let mut h = harness(1); // 32-byte chunks
        let (k, tier) = key(16, &mut h);
        let data: Vec<u8> = (1..=40).collect();
        let mut output = Vec::new();
        let recorder = Recorder::default();

        let status = StreamProcessor::new(&recorder)
            .process(
                &mut h.ctx,
                Action::Encrypt,
                &k,
                tier,
                &mut Cursor::new(data.clone()),
                &mut output,
            )
            .unwrap();
        assert!(status.is_success());

        let calls = recorder.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.len() == 32));
        assert_eq!(&calls[0][..], &data[..32]);
        // Final chunk: 8 real bytes then zeros, nothing left over from chunk 0
        assert_eq!(&calls[1][..8], &data[32..]);
        assert!(calls[1][8..].iter().all(|&b| b == 0));

        // Output keeps only the bytes read
        assert_eq!(output.len(), 40);
        let expected: Vec<u8> = data.iter().map(|b| !b).collect();
        assert_eq!(output, expected);
    }

    #[test]
    fn test_records_and_totals_agree() {
        let mut h = harness(2); // 64-byte chunks
        let (k, tier) = key(24, &mut h);
        let data = vec![0xEEu8; 64 * 3 + 5];
        let mut output = Vec::new();

        StreamProcessor::new(TwofishTransform)
            .process(&mut h.ctx, Action::Encrypt, &k, tier, &mut Cursor::new(data), &mut output)
            .unwrap();

        let rows = report_rows(&h.report);
        assert_eq!(rows.len(), 4);
        let sizes: Vec<&str> = rows.iter().map(|r| r[1].as_str()).collect();
        assert_eq!(sizes, ["64", "64", "64", "5"]);
        assert!(rows.iter().all(|r| r[2] == "64"));
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row[0], i.to_string());
        }

        let sum: f64 = rows.iter().map(|r| r[4].parse::<f64>().unwrap()).sum();
        assert!((sum - h.ctx.totals.elapsed_seconds).abs() < 1e-6);
        assert_eq!(h.ctx.totals.iterations, 4);
        assert_eq!(h.ctx.totals.bytes_processed, 197);

        let log = h.log.text();
        assert!(log.contains("Valid key size - 192 bits"));
        assert!(log.contains("iteration 3: read 5 bytes"));
        assert!(h.console.text().contains("iteration 3: processed 5 bytes in "));
    }

    #[test]
    fn test_exact_multiple_has_full_last_chunk() {
        let mut h = harness(1);
        let (k, tier) = key(32, &mut h);
        let mut output = Vec::new();
        StreamProcessor::new(TwofishTransform)
            .process(
                &mut h.ctx,
                Action::Encrypt,
                &k,
                tier,
                &mut Cursor::new(vec![3u8; 96]),
                &mut output,
            )
            .unwrap();

        let rows = report_rows(&h.report);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2][1], "32");
        assert_eq!(output.len(), 96);
    }

    #[test]
    fn test_empty_input_succeeds_with_no_iterations() {
        let mut h = harness(1);
        let (k, tier) = key(16, &mut h);
        let mut output = Vec::new();
        let status = StreamProcessor::new(TwofishTransform)
            .process(
                &mut h.ctx,
                Action::Decrypt,
                &k,
                tier,
                &mut Cursor::new(Vec::new()),
                &mut output,
            )
            .unwrap();
        assert!(status.is_success());
        assert!(output.is_empty());
        assert_eq!(h.ctx.totals.iterations, 0);
    }

    #[test]
    fn test_write_failure_propagates_as_io() {
        let mut h = harness(1);
        let (k, tier) = key(16, &mut h);
        let result = StreamProcessor::new(TwofishTransform).process(
            &mut h.ctx,
            Action::Encrypt,
            &k,
            tier,
            &mut Cursor::new(vec![5u8; 100]),
            &mut BrokenSink,
        );

        assert!(matches!(result, Err(HarnessError::Io(_))));
        // The first chunk is reported before its write fails; nothing after it
        assert!(report_rows(&h.report).len() <= 1);
        assert_eq!(h.ctx.totals.iterations, 1);
    }

    #[test]
    fn test_read_failure_is_not_a_short_read() {
        let mut h = harness(1);
        let (k, tier) = key(16, &mut h);
        let mut output = Vec::new();
        let result = StreamProcessor::new(TwofishTransform).process(
            &mut h.ctx,
            Action::Encrypt,
            &k,
            tier,
            &mut BrokenSource { len: 64 },
            &mut output,
        );

        assert!(matches!(result, Err(HarnessError::Io(_))));
        assert!(report_rows(&h.report).is_empty());
        assert!(output.is_empty());
        assert_eq!(h.ctx.totals, RunTotals::default());
    }

    #[test]
    fn test_transform_failure_stops_before_write() {
        let mut h = harness(1);
        let (k, tier) = key(16, &mut h);
        let mut output = Vec::new();
        let result = StreamProcessor::new(Refusing).process(
            &mut h.ctx,
            Action::Decrypt,
            &k,
            tier,
            &mut Cursor::new(vec![5u8; 40]),
            &mut output,
        );

        assert!(matches!(result, Err(HarnessError::Transform(_))));
        assert!(report_rows(&h.report).is_empty());
        assert!(output.is_empty());
    }

    #[test]
    fn test_totals_never_decrease() {
        let mut totals = RunTotals::default();
        let mut last = 0.0;
        for (i, secs) in [0.5, 0.0, 1.25].into_iter().enumerate() {
            totals.add(&IterationRecord {
                index: i as u64,
                bytes_read: 1,
                buffer_capacity: 1,
                elapsed_nanos: (secs * 1e9) as u64,
                elapsed_seconds: secs,
            });
            assert!(totals.elapsed_seconds >= last);
            last = totals.elapsed_seconds;
        }
        assert_eq!(totals.iterations, 3);
        assert!((totals.elapsed_seconds - 1.75).abs() < f64::EPSILON);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn length_preserving_primitive_roundtrips_any_length(
            data in proptest::collection::vec(any::<u8>(), 0..300),
        ) {
            let mut h = harness(2);
            let (k, tier) = key(16, &mut h);
            let recorder = Recorder::default();
            let processor = StreamProcessor::new(&recorder);

            let mut sealed = Vec::new();
            processor
                .process(
                    &mut h.ctx,
                    Action::Encrypt,
                    &k,
                    tier,
                    &mut Cursor::new(data.clone()),
                    &mut sealed,
                )
                .unwrap();
            prop_assert_eq!(sealed.len(), data.len());

            let mut opened = Vec::new();
            processor
                .process(
                    &mut h.ctx,
                    Action::Decrypt,
                    &k,
                    tier,
                    &mut Cursor::new(sealed),
                    &mut opened,
                )
                .unwrap();
            prop_assert_eq!(opened, data);
        }

        #[test]
        fn twofish_roundtrips_whole_cipher_blocks(
            blocks in 0usize..20,
            seed in any::<u8>(),
            key_len in 0usize..=32,
        ) {
            let data: Vec<u8> = (0..blocks * 16)
                .map(|i| (i as u8).wrapping_mul(31) ^ seed)
                .collect();
            let mut h = harness(2);
            let (k, tier) = key(key_len, &mut h);
            let processor = StreamProcessor::new(TwofishTransform);

            let mut sealed = Vec::new();
            processor
                .process(
                    &mut h.ctx,
                    Action::Encrypt,
                    &k,
                    tier,
                    &mut Cursor::new(data.clone()),
                    &mut sealed,
                )
                .unwrap();

            let mut opened = Vec::new();
            processor
                .process(
                    &mut h.ctx,
                    Action::Decrypt,
                    &k,
                    tier,
                    &mut Cursor::new(sealed),
                    &mut opened,
                )
                .unwrap();
            prop_assert_eq!(opened, data);
        }

        #[test]
        fn iteration_accounting(len in 0usize..500) {
            let mut h = harness(1);
            let (k, tier) = key(16, &mut h);
            let mut output = Vec::new();
            StreamProcessor::new(TwofishTransform)
                .process(
                    &mut h.ctx,
                    Action::Encrypt,
                    &k,
                    tier,
                    &mut Cursor::new(vec![1u8; len]),
                    &mut output,
                )
                .unwrap();

            let rows = report_rows(&h.report);
            prop_assert_eq!(rows.len(), len.div_ceil(32));
            for (i, row) in rows.iter().enumerate() {
                let read: usize = row[1].parse().unwrap();
                if i + 1 < rows.len() {
                    prop_assert_eq!(read, 32);
                } else {
                    let rem = len % 32;
                    prop_assert_eq!(read, if rem == 0 { 32 } else { rem });
                }
            }
        }
    }
}
