use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use tokio::{
    sync::broadcast::{self, Sender},
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, error, info, trace, warn};

use crate::{
    externals::{
        display::renderers::Renderer,
        sensor_endpoints::services::{FetchError, ReadingService},
    },
    models::{board::Board, display_update::DisplayUpdate, reading::Quantity},
};

/// What a single refresh cycle managed to do.
#[derive(Debug)]
pub struct CycleOutcome {
    /// Display updates published before the cycle finished or aborted.
    pub updated: usize,
    /// The quantity whose fetch aborted the cycle, with the error.
    pub aborted: Option<(Quantity, FetchError)>,
}

impl CycleOutcome {
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }
}

/// Task: Runs a refresh cycle every `period`, starting one period after launch.
/// Each cycle runs as its own task so a slow cycle never holds back the next tick.
/// Can be cancelled, after which in-flight cycles are awaited.
#[tracing::instrument(skip_all)]
pub async fn task_poll_readings<S>(
    token: CancellationToken,
    service: Arc<S>,
    period: Duration,
    tx_display_update: Sender<DisplayUpdate>,
) where
    S: ReadingService + Send + Sync + 'static,
{
    info!("Started.");

    let cycles = TaskTracker::new();
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                warn!("Cancelled.");
                break;
            },
            _ = ticker.tick() => {
                trace!("Tick. {} cycles still running.", cycles.len());
                let service = service.clone();
                let tx_display_update = tx_display_update.clone();
                cycles.spawn(async move {
                    run_refresh_cycle(service.as_ref(), &tx_display_update).await
                });
            }
        };
    }

    cycles.close();
    cycles.wait().await;
}

/// Fetch every quantity in refresh order and publish a display update for each.
/// The first failed fetch abandons the rest of the cycle. Updates already
/// published stay on the display.
#[tracing::instrument(skip_all)]
pub async fn run_refresh_cycle(
    service: &impl ReadingService,
    tx_display_update: &Sender<DisplayUpdate>,
) -> CycleOutcome {
    trace!("Executing refresh cycle.");
    let mut updated = 0;

    for quantity in Quantity::REFRESH_ORDER {
        let reading = match service.fetch(quantity).await {
            Ok(reading) => reading,
            Err(e) => {
                warn!(
                    "Failed to fetch {}, abandoning the rest of this cycle. Error: {}",
                    quantity, e
                );
                return CycleOutcome {
                    updated,
                    aborted: Some((quantity, e)),
                };
            }
        };

        debug!("Got {} reading: {}", quantity, reading);
        if !reading.is_plausible() {
            warn!(
                "{} reading {} is outside the range the sensor can report.",
                quantity, reading
            );
        }
        if let Err(e) = tx_display_update.send(DisplayUpdate::from(reading)) {
            error!("Failed to broadcast display update. Error: {}", e);
        } else {
            trace!("Sent a display update.");
            updated += 1;
        }
    }

    CycleOutcome {
        updated,
        aborted: None,
    }
}

/// Page load, one refresh cycle, one redraw.
/// Fails if the cycle was abandoned part way.
pub async fn run_once(service: &impl ReadingService, renderer: &mut impl Renderer) -> Result<()> {
    let (tx_display_update, mut rx_display_update) = broadcast::channel(32);

    let mut board = Board::default();
    board.on_load();

    let outcome = run_refresh_cycle(service, &tx_display_update).await;
    while let Ok(update) = rx_display_update.try_recv() {
        board.apply(&update);
    }
    renderer.render(&board)?;

    match outcome.aborted {
        None => Ok(()),
        Some((quantity, e)) => {
            warn!(
                "Only {} of {} elements updated.",
                outcome.updated,
                Quantity::REFRESH_ORDER.len()
            );
            Err(anyhow!(e).context(format!("Refresh cycle stopped at {}", quantity)))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use reqwest::Url;
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::{
        externals::display::renderers::PlainRenderer,
        models::{element::ElementId, reading::Reading},
    };

    /// Serves fixed raw values, each after `delay`. Quantities without a value
    /// fail to fetch.
    struct FakeService {
        values: HashMap<Quantity, f64>,
        delay: Duration,
        requested: Mutex<Vec<Quantity>>,
    }

    impl FakeService {
        fn new(values: &[(Quantity, f64)]) -> Self {
            Self {
                values: values.iter().copied().collect(),
                delay: Duration::ZERO,
                requested: Mutex::new(vec![]),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn requested(&self) -> Vec<Quantity> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl ReadingService for FakeService {
        async fn fetch(&self, quantity: Quantity) -> Result<Reading, FetchError> {
            self.requested.lock().unwrap().push(quantity);
            if !self.delay.is_zero() {
                time::sleep(self.delay).await;
            }
            match self.values.get(&quantity) {
                Some(raw) => Reading::from_raw(quantity, *raw)
                    .map_err(|source| FetchError::Invalid { quantity, source }),
                None => Err(FetchError::NotANumber {
                    url: Url::parse("http://sensor.invalid/").unwrap(),
                    body: "null".into(),
                }),
            }
        }
    }

    fn drain(rx: &mut broadcast::Receiver<DisplayUpdate>) -> Vec<DisplayUpdate> {
        let mut updates = vec![];
        loop {
            match rx.try_recv() {
                Ok(update) => updates.push(update),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(_)) => continue,
            }
        }
        updates
    }

    #[tokio::test]
    async fn test_complete_cycle_updates_every_element_in_order() {
        let service = FakeService::new(&[
            (Quantity::Humidity, 55.4),
            (Quantity::Temperature, 21.37),
            (Quantity::Co2, 812.0),
        ]);
        let (tx, mut rx) = broadcast::channel(32);

        let outcome = run_refresh_cycle(&service, &tx).await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.updated, 3);
        assert_eq!(service.requested(), Quantity::REFRESH_ORDER.to_vec());
        assert_eq!(
            drain(&mut rx),
            vec![
                DisplayUpdate {
                    element: ElementId::Humidity,
                    text: "55%".into()
                },
                DisplayUpdate {
                    element: ElementId::Temperature,
                    text: "21.4°C".into()
                },
                DisplayUpdate {
                    element: ElementId::Co2Ppm,
                    text: "812 PPM".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_abandons_rest_of_cycle() {
        let service = FakeService::new(&[(Quantity::Humidity, 40.0), (Quantity::Co2, 650.0)]);
        let (tx, mut rx) = broadcast::channel(32);

        let outcome = run_refresh_cycle(&service, &tx).await;

        assert_eq!(outcome.updated, 1);
        assert!(matches!(outcome.aborted, Some((Quantity::Temperature, _))));
        assert_eq!(
            service.requested(),
            vec![Quantity::Humidity, Quantity::Temperature]
        );

        let updates = drain(&mut rx);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].element, ElementId::Humidity);
        assert_eq!(updates[0].text, "40%");
    }

    #[tokio::test]
    async fn test_out_of_range_reading_is_shown_and_cycle_continues() {
        let service = FakeService::new(&[
            (Quantity::Humidity, 100.4),
            (Quantity::Temperature, 21.37),
            (Quantity::Co2, 812.0),
        ]);
        let (tx, mut rx) = broadcast::channel(32);

        let outcome = run_refresh_cycle(&service, &tx).await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.updated, 3);
        let texts = drain(&mut rx)
            .into_iter()
            .map(|update| update.text)
            .collect::<Vec<_>>();
        assert_eq!(texts, vec!["100%", "21.4°C", "812 PPM"]);
    }

    #[tokio::test]
    async fn test_non_finite_first_reading_publishes_nothing() {
        let service = FakeService::new(&[
            (Quantity::Humidity, f64::NAN),
            (Quantity::Temperature, 20.0),
            (Quantity::Co2, 400.0),
        ]);
        let (tx, mut rx) = broadcast::channel(32);

        let outcome = run_refresh_cycle(&service, &tx).await;

        assert_eq!(outcome.updated, 0);
        assert!(matches!(
            outcome.aborted,
            Some((Quantity::Humidity, FetchError::Invalid { .. }))
        ));
        assert_eq!(service.requested(), vec![Quantity::Humidity]);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_task_waits_one_period_before_first_cycle() {
        let service = Arc::new(FakeService::new(&[
            (Quantity::Humidity, 50.0),
            (Quantity::Temperature, 20.0),
            (Quantity::Co2, 400.0),
        ]));
        let (tx, mut rx) = broadcast::channel(32);
        let token = CancellationToken::new();
        let period = Duration::from_millis(2000);

        let start = Instant::now();
        let handle = tokio::spawn(task_poll_readings(
            token.clone(),
            service.clone(),
            period,
            tx,
        ));

        let first = rx.recv().await.unwrap();
        assert!(start.elapsed() >= period);
        assert_eq!(first.element, ElementId::Humidity);

        token.cancel();
        handle.await.unwrap();
        assert_eq!(service.requested().len() % 3, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_task_keeps_ticking() {
        let service = Arc::new(FakeService::new(&[
            (Quantity::Humidity, 50.0),
            (Quantity::Temperature, 20.0),
            (Quantity::Co2, 400.0),
        ]));
        let (tx, mut rx) = broadcast::channel(32);
        let token = CancellationToken::new();

        let handle = tokio::spawn(task_poll_readings(
            token.clone(),
            service.clone(),
            Duration::from_millis(2000),
            tx,
        ));

        for _ in 0..6 {
            rx.recv().await.unwrap();
        }

        token.cancel();
        handle.await.unwrap();
        assert!(service.requested().len() >= 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_cycle_does_not_hold_back_next_tick() {
        // Each fetch takes 1.5 s, so one cycle takes 4.5 s against a 2 s period.
        let service = Arc::new(
            FakeService::new(&[
                (Quantity::Humidity, 50.0),
                (Quantity::Temperature, 20.0),
                (Quantity::Co2, 400.0),
            ])
            .with_delay(Duration::from_millis(1500)),
        );
        let (tx, mut rx) = broadcast::channel(32);
        let token = CancellationToken::new();

        let handle = tokio::spawn(task_poll_readings(
            token.clone(),
            service.clone(),
            Duration::from_millis(2000),
            tx,
        ));

        // First cycle: humidity at 2.0 s, temperature at 3.5 s, co2 at 5.0 s.
        // Second cycle: humidity at 4.0 s.
        time::sleep(Duration::from_millis(4100)).await;

        assert_eq!(
            service.requested(),
            vec![Quantity::Humidity, Quantity::Temperature, Quantity::Humidity]
        );
        let updates = drain(&mut rx);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].element, ElementId::Humidity);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_waits_for_in_flight_cycle() {
        let service = Arc::new(
            FakeService::new(&[
                (Quantity::Humidity, 55.4),
                (Quantity::Temperature, 21.37),
                (Quantity::Co2, 812.0),
            ])
            .with_delay(Duration::from_millis(500)),
        );
        let (tx, mut rx) = broadcast::channel(32);
        let token = CancellationToken::new();

        let handle = tokio::spawn(task_poll_readings(
            token.clone(),
            service.clone(),
            Duration::from_millis(2000),
            tx,
        ));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.element, ElementId::Humidity);

        // The cycle still has temperature and co2 to fetch.
        token.cancel();
        handle.await.unwrap();

        let rest = drain(&mut rx);
        assert_eq!(
            rest.iter().map(|update| update.element).collect::<Vec<_>>(),
            vec![ElementId::Temperature, ElementId::Co2Ppm]
        );
        assert_eq!(service.requested().len(), 3);
    }

    #[tokio::test]
    async fn test_run_once_renders_complete_cycle() {
        let service = FakeService::new(&[
            (Quantity::Humidity, 55.4),
            (Quantity::Temperature, 21.37),
            (Quantity::Co2, 812.0),
        ]);
        let mut renderer = PlainRenderer::new(Vec::new());

        run_once(&service, &mut renderer).await.unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(
            output,
            "co2ppm: 812 PPM | temperature: 21.4°C | humidity: 55%\n"
        );
    }

    #[tokio::test]
    async fn test_run_once_fails_when_cycle_is_abandoned() {
        let service = FakeService::new(&[(Quantity::Humidity, 40.0), (Quantity::Co2, 650.0)]);
        let mut renderer = PlainRenderer::new(Vec::new());

        let result = run_once(&service, &mut renderer).await;

        let e = result.unwrap_err();
        assert_eq!(e.to_string(), "Refresh cycle stopped at temperature");

        // The partial board is still drawn before failing.
        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(output, "co2ppm: … | temperature: … | humidity: 40%\n");
    }
}
