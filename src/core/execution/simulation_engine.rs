use crate::core::cascade::CascadeGenerator;
use crate::core::detector::EnergyHistogram;
use crate::core::errors::{MergeError, SimError};
use crate::core::execution::config::{ConcurrencyMode, RunConfig};
use crate::core::execution::worker::{Worker, WorkerReport};
use crate::core::merge::{record_channel, EventRecord, MergeOutcome, OutputCoordinator, RecordMerger};
use crate::core::random::RandomSource;
use crate::core::record::RecordWriter;
use crate::core::scheme::LevelScheme;
use crate::core::transport::Transport;
use crate::core::types::WorkerId;
use crossbeam_channel::Sender;
use log::{info, warn};
use rayon::prelude::*;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Shared flag that asks every worker to stop after its current event
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub seed: u64,
    /// Events simulated over all workers
    pub events: u64,
    /// Records appended to the output stream
    pub records: u64,
    /// Records in which at least one detector fired
    pub records_with_data: u64,
    /// Whether the run was cut short through a [`StopHandle`]
    pub stopped: bool,
    pub workers: Vec<WorkerReport>,
    /// Per-detector spectra summed over all workers
    pub histograms: Vec<EnergyHistogram>,
}

impl RunSummary {
    pub fn gammas(&self) -> u64 {
        self.workers.iter().map(|w| w.gammas).sum()
    }

    pub fn detectors_fired(&self) -> u64 {
        self.workers.iter().map(|w| w.detectors_fired).sum()
    }

    /// Write the summed spectra as `detector bin_low count` lines
    pub fn write_histograms<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for (detector, histogram) in self.histograms.iter().enumerate() {
            histogram.write_text(detector, out)?;
        }
        Ok(())
    }
}

/// Drives a run: N workers simulating events and one coordinating thread
/// writing their records.
pub struct SimulationEngine {
    config: RunConfig,
    generator: CascadeGenerator,
    seed: u64,
    run_id: Uuid,
    stop: StopHandle,
}

impl SimulationEngine {
    /// Create an engine for `scheme`. Fails on an invalid configuration or
    /// a level scheme in which cascades could loop.
    pub fn new(config: RunConfig, scheme: Arc<LevelScheme>) -> Result<Self, SimError> {
        config.validate()?;
        let generator = CascadeGenerator::new(scheme)?;
        let seed = match config.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random::<u64>();
                info!("No seed configured, using random seed {}", seed);
                seed
            }
        };

        Ok(Self {
            config,
            generator,
            seed,
            run_id: Uuid::new_v4(),
            stop: StopHandle::new(),
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Handle that stops the run between events
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Run every configured event, writing one record per event to `output`.
    ///
    /// `make_transport` builds each worker's transport. Returns the run
    /// summary together with the flushed output stream.
    pub fn run<W, T, F>(&self, output: W, make_transport: F) -> Result<(RunSummary, W), SimError>
    where
        W: Write + Send,
        T: Transport,
        F: Fn(WorkerId) -> T + Sync,
    {
        let config = &self.config;
        info!(
            "Run {}: {} events on {} workers ({:?}), {} detectors, seed {}",
            self.run_id, config.events, config.threads, config.concurrency_mode, config.detectors, self.seed
        );

        let writer = RecordWriter::new(output, config.format, self.run_id, config.detectors, config.fields)
            .map_err(MergeError::from)?;
        let coordinator = OutputCoordinator::new(writer, config.detectors, config.fields, config.threads);
        let (sender, receiver) = record_channel(config.channel_capacity);

        let (outcome, reports) = std::thread::scope(|scope| {
            let writer_thread = scope.spawn(move || coordinator.run(receiver));
            let reports = self.run_workers(sender, &make_transport);
            let outcome = writer_thread.join().map_err(|_| SimError::WriterPanicked);
            (outcome, reports)
        });
        // An output failure is the root cause of any worker disconnects
        let outcome: MergeOutcome<W> = outcome??;
        let reports = reports?;

        let summary = self.summarize(&outcome, reports);
        info!(
            "Run {} finished: {} events, {} records ({} with data), {} gammas",
            summary.run_id,
            summary.events,
            summary.records,
            summary.records_with_data,
            summary.gammas()
        );
        for report in &summary.workers {
            if report.stray_hits > 0 || report.ignored_writes > 0 {
                warn!(
                    "Worker {}: {} hits on unknown detectors and {} out-of-range writes ignored",
                    report.worker, report.stray_hits, report.ignored_writes
                );
            }
        }
        Ok((summary, outcome.output))
    }

    fn run_workers<T, F>(
        &self,
        sender: Sender<EventRecord>,
        make_transport: &F,
    ) -> Result<Vec<WorkerReport>, SimError>
    where
        T: Transport,
        F: Fn(WorkerId) -> T + Sync,
    {
        let run_one = |id: WorkerId| {
            let worker = Worker::new(
                id,
                RandomSource::for_worker(self.seed, id),
                self.generator.clone(),
                make_transport(id),
                &self.config,
                RecordMerger::new(id, sender.clone()),
            );
            worker.run(self.config.events_for_worker(id), &self.stop)
        };

        let threads = self.config.threads;
        let reports = match self.config.concurrency_mode {
            ConcurrencyMode::Sequential => (0..threads).map(run_one).collect::<Result<Vec<_>, _>>(),
            ConcurrencyMode::Rayon => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("cascade-worker-{}", i))
                    .build()?;
                pool.install(|| (0..threads).into_par_iter().map(run_one).collect::<Result<Vec<_>, _>>())
            }
        };
        Ok(reports?)
    }

    fn summarize<W>(&self, outcome: &MergeOutcome<W>, workers: Vec<WorkerReport>) -> RunSummary {
        let mut histograms = vec![EnergyHistogram::default(); self.config.detectors];
        for report in &workers {
            for (total, histogram) in histograms.iter_mut().zip(&report.histograms) {
                total.merge(histogram);
            }
        }

        RunSummary {
            run_id: self.run_id,
            seed: self.seed,
            events: workers.iter().map(|w| w.events).sum(),
            records: outcome.records,
            records_with_data: outcome.records_with_data,
            stopped: self.stop.is_stopped(),
            workers,
            histograms,
        }
    }
}
