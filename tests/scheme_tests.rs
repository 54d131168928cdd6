use cascade_sim::{CascadeGenerator, LevelScheme, RandomSource, SchemeError};
use std::collections::HashMap;
use std::sync::Arc;

const SINGLE_LEVEL: &str = "\
level 1000 1000 100
level 0 -1 0
transition 1000 0 100
";

const EU152_LIKE: &str = "\
level 0 -1 0
level 121.78 1.9 0
level 366.5 0.1 0
level 1529.8 0.5 60
level 1233.9 2.0 40
transition 1529.8 121.78 40
transition 1529.8 366.5 20
transition 1529.8 0 40
transition 366.5 121.78 100
transition 1233.9 121.78 100
transition 121.78 0 100
";

#[test]
fn test_single_transition_example() {
    let (scheme, report) = LevelScheme::parse_str(SINGLE_LEVEL, true).unwrap();
    assert_eq!(report.levels, 2);
    assert_eq!(report.transitions, 1);

    let generator = CascadeGenerator::new(Arc::new(scheme)).unwrap();
    let mut rng = RandomSource::from_seed(1000);
    for _ in 0..5000 {
        let mut cascade = generator.cascade(&mut rng);
        let gamma = cascade.next().unwrap();
        assert_eq!(gamma.energy, 1000.0);
        // The parent's lifetime is outside the event window: first emission at t = 0
        assert_eq!(gamma.time, 0.0);
        assert!(cascade.next().is_none());
    }
}

#[test]
fn test_cascades_follow_branching() {
    let (scheme, _) = LevelScheme::parse_str(EU152_LIKE, true).unwrap();
    let scheme = Arc::new(scheme);
    let generator = CascadeGenerator::new(scheme.clone()).unwrap();
    let bound = scheme.longest_cascade().unwrap();
    assert_eq!(bound, 3);

    let mut rng = RandomSource::from_seed(17);
    let mut energies: HashMap<u64, u64> = HashMap::new();
    let n = 40_000;
    for _ in 0..n {
        let gammas = generator.generate(&mut rng);
        assert!(!gammas.is_empty() && gammas.len() <= bound);

        let mut previous = 0.0;
        for gamma in &gammas {
            assert!(gamma.time >= previous);
            previous = gamma.time;
            let transition = scheme.transition(gamma.transition).unwrap();
            assert_eq!(gamma.energy, transition.energy());
            *energies.entry((gamma.energy * 100.0).round() as u64).or_default() += 1;
        }
        // Every cascade ends on the ground state
        let last = scheme.transition(gammas.last().unwrap().transition).unwrap();
        assert_eq!(scheme.level(last.target()).unwrap().energy(), 0.0);
    }

    // 1529.8 -> 0 happens in 60% x 40% of events
    let direct = energies[&152980] as f64 / n as f64;
    assert!((direct - 0.24).abs() < 0.015, "direct branch was {}", direct);
    // Every cascade except the direct branch passes through 121.78 keV
    let via_121 = energies[&12178] as f64 / n as f64;
    assert!((via_121 - 0.76).abs() < 0.015, "121.78 keV share was {}", via_121);
}

#[test]
fn test_permissive_load_drops_bad_lines() {
    let text = "\
level 0 -1 0
level 500 10 1
level 500 broken
transition 500 0 1
transition 500 250 1
free text
";
    let (scheme, report) = LevelScheme::parse_str(text, false).unwrap();
    assert_eq!(scheme.levels().len(), 2);
    assert_eq!(scheme.transitions().len(), 1);
    assert_eq!(report.malformed_lines, 1);
    assert_eq!(report.unresolved_transitions, 1);
    assert_eq!(report.ignored_lines, 1);
    assert!(report.has_drops());

    assert!(matches!(
        LevelScheme::parse_str(text, true),
        Err(SchemeError::MalformedLine { line: 3, .. })
    ));
}

#[test]
fn test_missing_file() {
    let path = "does/not/exist/levelscheme.dat";
    let (scheme, _) = LevelScheme::load_path_or_empty(path).unwrap();
    assert!(scheme.is_empty());
    assert!(matches!(
        LevelScheme::load_path(path, false),
        Err(SchemeError::Open { .. })
    ));

    let generator = CascadeGenerator::new(Arc::new(scheme)).unwrap();
    let mut rng = RandomSource::from_seed(3);
    assert!(generator.generate(&mut rng).is_empty());
}

#[test]
fn test_scheme_listing() {
    let (scheme, _) = LevelScheme::parse_str(SINGLE_LEVEL, true).unwrap();
    let listing = scheme.to_string();
    assert!(listing.contains("Level: energy = 1000.000 keV"));
    assert!(listing.contains("Transition: energy = 1000.00 keV intensity = 100.00 %"));
    assert!(listing.contains("stable"));
}
