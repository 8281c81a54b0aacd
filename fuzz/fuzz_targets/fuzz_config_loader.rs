#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Any TOML text must either fail to parse or validate without panicking,
    // and a validated config must yield a usable A/D setup.
    if let Ok(cfg) = extcal_config::load_toml(data) {
        if cfg.validate().is_ok() {
            let setup = cfg.adc_setup();
            assert_eq!(extcal_traits::InputRange::from(cfg.adc.range), setup.range);
        }
    }
});
