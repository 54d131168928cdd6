use crate::core::cascade::CascadeGenerator;
use crate::core::detector::{DetectorHitAccumulator, EnergyHistogram};
use crate::core::errors::MergeError;
use crate::core::execution::config::RunConfig;
use crate::core::execution::simulation_engine::StopHandle;
use crate::core::merge::RecordMerger;
use crate::core::random::RandomSource;
use crate::core::record::RecordBuffer;
use crate::core::transport::{HitSink, Transport};
use crate::core::types::{DetectorId, Position, WorkerId};
use log::debug;

/// The detectors of one worker, fed by the transport during an event
#[derive(Debug)]
struct DetectorArray {
    accumulators: Vec<DetectorHitAccumulator>,
    hits: u64,
    stray_hits: u64,
}

impl DetectorArray {
    fn reset(&mut self) {
        for acc in &mut self.accumulators {
            acc.reset();
        }
    }
}

impl HitSink for DetectorArray {
    fn record_hit(&mut self, detector: DetectorId, energy: f64, time: f64, position: Position) {
        match self.accumulators.get_mut(detector) {
            Some(acc) => {
                acc.record_hit(energy, time, position);
                self.hits += 1;
            }
            None => self.stray_hits += 1,
        }
    }
}

/// Counters and spectra of one worker after its share of the run
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub worker: WorkerId,
    pub events: u64,
    pub gammas: u64,
    pub hits: u64,
    /// Deposits reported for a detector index that does not exist
    pub stray_hits: u64,
    /// Detector records produced (detectors above threshold, summed over events)
    pub detectors_fired: u64,
    /// Record writes dropped because a field index was out of range
    pub ignored_writes: u64,
    pub histograms: Vec<EnergyHistogram>,
}

/// Simulates a disjoint sequence of events.
///
/// Everything a worker mutates (random source, accumulators, record buffer,
/// spectra) is owned by it; the only thing it shares is the merge channel.
pub struct Worker<T: Transport> {
    id: WorkerId,
    rng: RandomSource,
    generator: CascadeGenerator,
    transport: T,
    detectors: DetectorArray,
    buffer: RecordBuffer,
    histograms: Vec<EnergyHistogram>,
    merger: RecordMerger,
    gammas: u64,
    detectors_fired: u64,
}

impl<T: Transport> Worker<T> {
    pub fn new(
        id: WorkerId,
        rng: RandomSource,
        generator: CascadeGenerator,
        transport: T,
        config: &RunConfig,
        merger: RecordMerger,
    ) -> Self {
        let accumulators = (0..config.detectors)
            .map(|d| DetectorHitAccumulator::new(d, config.detector_config(d)))
            .collect();
        Self {
            id,
            rng,
            generator,
            transport,
            detectors: DetectorArray {
                accumulators,
                hits: 0,
                stray_hits: 0,
            },
            buffer: RecordBuffer::new(config.detectors, config.fields),
            histograms: vec![EnergyHistogram::default(); config.detectors],
            merger,
            gammas: 0,
            detectors_fired: 0,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Simulate one event and hand its record to the output stream
    pub fn run_event(&mut self, event: u64) -> Result<(), MergeError> {
        self.detectors.reset();

        let gammas = self.generator.generate(&mut self.rng);
        self.gammas += gammas.len() as u64;
        self.transport
            .transport(&gammas, &mut self.rng, &mut self.detectors);

        for acc in &self.detectors.accumulators {
            if let Some(record) = acc.finalize(&mut self.rng) {
                for (field, value) in record.values().into_iter().enumerate() {
                    self.buffer.set_value(acc.id(), field, value);
                }
                self.histograms[acc.id()].fill(record.energy);
                self.detectors_fired += 1;
            }
        }

        self.merger.merge(event, &mut self.buffer)
    }

    /// Run `events` events, stopping early if `stop` is raised
    pub fn run(mut self, events: u64, stop: &StopHandle) -> Result<WorkerReport, MergeError> {
        debug!("Worker {} starting {} events", self.id, events);
        let mut done = 0;
        while done < events && !stop.is_stopped() {
            self.run_event(done)?;
            done += 1;
        }
        debug!("Worker {} finished after {} events", self.id, done);

        Ok(WorkerReport {
            worker: self.id,
            events: done,
            gammas: self.gammas,
            hits: self.detectors.hits,
            stray_hits: self.detectors.stray_hits,
            detectors_fired: self.detectors_fired,
            ignored_writes: self.buffer.ignored_writes(),
            histograms: self.histograms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cascade::EmittedGamma;
    use crate::core::detector::DetectorConfig;
    use crate::core::merge::record_channel;
    use crate::core::scheme::LevelScheme;
    use std::sync::Arc;

    /// Puts every gamma into detector `gamma index % detectors`
    struct RoundRobin {
        detectors: usize,
    }

    impl Transport for RoundRobin {
        fn transport(&mut self, gammas: &[EmittedGamma], _rng: &mut RandomSource, hits: &mut dyn HitSink) {
            for (i, gamma) in gammas.iter().enumerate() {
                hits.record_hit(i % self.detectors, gamma.energy, gamma.time, Position::new(1.0, 2.0, 3.0));
            }
        }
    }

    fn cascade_1173_1332() -> CascadeGenerator {
        let mut scheme = LevelScheme::new();
        scheme.add_level(0.0, -1.0, 0.0);
        scheme.add_level(1332.5, 0.9, 0.0);
        scheme.add_level(2505.7, 3.3, 1.0);
        scheme.add_transition(2505.7, 1332.5, 1.0).unwrap();
        scheme.add_transition(1332.5, 0.0, 1.0).unwrap();
        CascadeGenerator::new(Arc::new(scheme)).unwrap()
    }

    fn sharp_config(detectors: usize) -> RunConfig {
        RunConfig::new()
            .with_detectors(detectors)
            .with_detector_configs(vec![DetectorConfig::new(0.0, 0.0, 100.0); detectors])
    }

    #[test]
    fn test_event_fills_one_record_per_event() {
        let config = sharp_config(2);
        let (tx, rx) = record_channel(16);
        let worker = Worker::new(
            0,
            RandomSource::from_seed(1),
            cascade_1173_1332(),
            RoundRobin { detectors: 2 },
            &config,
            RecordMerger::new(0, tx),
        );

        let report = worker.run(5, &StopHandle::new()).unwrap();
        assert_eq!(report.events, 5);
        assert_eq!(report.gammas, 10);
        assert_eq!(report.detectors_fired, 10);

        let records: Vec<_> = rx.try_iter().collect();
        assert_eq!(records.len(), 5);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.event, i as u64);
            assert!(record.has_data);
            assert_eq!(record.values.len(), 10);
            assert!((record.values[0] - (2505.7 - 1332.5)).abs() < 1e-9);
            assert_eq!(record.values[5], 1332.5);
            // First gamma is emitted at t = 0, so its time is just the offset
            assert_eq!(record.values[1], 100.0);
            assert!(record.values[6] >= 100.0);
            assert_eq!(&record.values[2..5], &[1.0, 2.0, 3.0]);
        }
        assert_eq!(report.histograms[1].counts()[1332], 5);
    }

    #[test]
    fn test_buffer_reset_between_events() {
        let config = sharp_config(3);
        let (tx, rx) = record_channel(16);
        let mut worker = Worker::new(
            0,
            RandomSource::from_seed(1),
            cascade_1173_1332(),
            RoundRobin { detectors: 2 },
            &config,
            RecordMerger::new(0, tx),
        );

        worker.run_event(0).unwrap();
        assert!(!worker.buffer.has_data());
        assert!(worker.buffer.values().iter().all(|&v| v == 0.0));
        worker.run_event(1).unwrap();

        let records: Vec<_> = rx.try_iter().collect();
        assert_eq!(records.len(), 2);
        // Detector 2 never receives a hit
        for record in records {
            assert_eq!(&record.values[10..15], &[0.0; 5]);
        }
    }

    #[test]
    fn test_stray_hits_counted() {
        let config = sharp_config(1);
        let (tx, _rx) = record_channel(4);
        let worker = Worker::new(
            0,
            RandomSource::from_seed(1),
            cascade_1173_1332(),
            RoundRobin { detectors: 2 },
            &config,
            RecordMerger::new(0, tx),
        );
        let report = worker.run(1, &StopHandle::new()).unwrap();
        assert_eq!(report.hits, 1);
        assert_eq!(report.stray_hits, 1);
    }

    #[test]
    fn test_stop_before_start() {
        let config = sharp_config(1);
        let (tx, rx) = record_channel(4);
        let worker = Worker::new(
            0,
            RandomSource::from_seed(1),
            cascade_1173_1332(),
            RoundRobin { detectors: 1 },
            &config,
            RecordMerger::new(0, tx),
        );
        let stop = StopHandle::new();
        stop.stop();
        let report = worker.run(100, &stop).unwrap();
        assert_eq!(report.events, 0);
        assert_eq!(rx.try_iter().count(), 0);
    }
}
