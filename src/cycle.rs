// ============================================================================
// Fetch Cycle Controller
// ============================================================================
// Possède la boucle de rafraîchissement de chaque instance de widget :
//
//   Idle → Fetching → (Success | Failed) → Idle
//
// - FetchCycle : un cycle de fetch (test de fraîcheur, requêtes,
//   normalisation, écriture dans le store) lié à une configuration figée
// - WidgetTask : la tâche tokio qui répète le cycle sur un timer et sur
//   demande ; annulée quand elle est droppée
// - CycleSupervisor : garde exactement une tâche par widget du store,
//   redémarrée en bloc quand la configuration change
//
// CONCEPTS RUST :
// 1. Arc + tâche tokio : le cycle est partagé entre le handle et la tâche
// 2. tokio::select! : attendre le timer OU une demande de refresh
// 3. Drop : détruire le handle = annuler le timer et ignorer le fetch en vol
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use crate::api::{aggregate_fan_out, build_plan, normalize, HttpFetch, RequestPlan};
use crate::error::FetchError;
use crate::models::{NormalizedData, Widget, WidgetConfig};
use crate::store::WidgetStore;

/// Phase d'un cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePhase {
    #[default]
    Idle,
    Fetching,
    Success,
    Failed,
}

/// Politique vis-à-vis du cache lors d'un refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Réutilise les données si elles sont encore fraîches
    IfStale,

    /// Ignore la fenêtre de fraîcheur
    Force,
}

/// Résultat d'un cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// URL vide : rien à faire
    Skipped,

    /// Données fraîches réutilisées, aucun appel réseau
    Cached,

    /// Nouvelles données écrites dans le store
    Fetched,

    /// Échec transitoire (message affiché, données inchangées)
    Failed(String),

    /// Instance détruite pendant le fetch : résultat ignoré
    Discarded,
}

/// État observable d'une instance (local, jamais persisté)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CycleStatus {
    pub phase: CyclePhase,

    /// Dernier message d'erreur (effacé au début de chaque cycle)
    pub error: Option<String>,

    pub last_attempt: Option<DateTime<Utc>>,
}

impl CycleStatus {
    pub fn is_fetching(&self) -> bool {
        self.phase == CyclePhase::Fetching
    }
}

// ============================================================================
// FetchCycle
// ============================================================================

/// Un cycle de fetch lié à une instance de widget
pub struct FetchCycle {
    widget_id: String,
    config: WidgetConfig,
    store: WidgetStore,
    client: Arc<dyn HttpFetch>,
    status: Mutex<CycleStatus>,

    /// Identité de l'instance : false une fois détruite
    alive: Mutex<bool>,
}

impl FetchCycle {
    /// Crée le cycle d'un widget avec sa configuration actuelle
    pub fn new(widget: &Widget, store: WidgetStore, client: Arc<dyn HttpFetch>) -> Self {
        Self {
            widget_id: widget.id.clone(),
            config: widget.config.clone(),
            store,
            client,
            status: Mutex::new(CycleStatus::default()),
            alive: Mutex::new(true),
        }
    }

    pub fn widget_id(&self) -> &str {
        &self.widget_id
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Période du timer : max(1, interval) secondes
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.config.interval.max(1))
    }

    pub fn status(&self) -> CycleStatus {
        self.status.lock().clone()
    }

    pub fn is_alive(&self) -> bool {
        *self.alive.lock()
    }

    /// Détruit l'instance
    ///
    /// Après le retour de teardown(), aucun résultat de cette instance ne
    /// peut plus atteindre le store.
    pub fn teardown(&self) {
        *self.alive.lock() = false;
    }

    /// Exécute un cycle
    ///
    /// `now` sert au test de fraîcheur ; l'horodatage écrit dans le store
    /// est celui de la fin du fetch.
    #[instrument(skip(self, now), fields(widget = %self.widget_id))]
    pub async fn run(&self, mode: RefreshMode, now: DateTime<Utc>) -> CycleOutcome {
        if !self.is_alive() {
            return CycleOutcome::Discarded;
        }

        let Some(plan) = build_plan(&self.config) else {
            debug!("Empty API URL, cycle skipped");
            return CycleOutcome::Skipped;
        };

        // Test de fraîcheur : évite les appels redondants quand plusieurs
        // déclencheurs coïncident (refresh manuel juste après le timer)
        if mode == RefreshMode::IfStale
            && self
                .store
                .get(&self.widget_id)
                .is_some_and(|widget| widget.is_fresh(now))
        {
            debug!("Cached data still fresh, network call skipped");
            self.set_status(CyclePhase::Success, None, now);
            return CycleOutcome::Cached;
        }

        self.set_status(CyclePhase::Fetching, None, now);
        debug!(requests = plan.request_count(), "Fetching widget data");
        let result = execute_plan(self.client.as_ref(), &plan, &self.config).await;

        // Le verrou d'identité est tenu pendant l'écriture : un teardown
        // concurrent attend la fin de l'écriture, ou l'empêche
        let alive = self.alive.lock();
        if !*alive {
            debug!("Instance torn down while fetching, result discarded");
            return CycleOutcome::Discarded;
        }

        match result {
            Ok(data) => {
                info!(shape = data.shape_label(), entries = data.len(), "Widget data fetched");
                if !self.store.update_data(&self.widget_id, data) {
                    return CycleOutcome::Discarded;
                }
                self.set_status(CyclePhase::Success, None, now);
                CycleOutcome::Fetched
            }
            Err(e) => {
                warn!(error = %e, "Widget fetch failed");
                let message = e.to_string();
                self.set_status(CyclePhase::Failed, Some(message.clone()), now);
                CycleOutcome::Failed(message)
            }
        }
    }

    fn set_status(&self, phase: CyclePhase, error: Option<String>, at: DateTime<Utc>) {
        let mut status = self.status.lock();
        status.phase = phase;
        status.error = error;
        status.last_attempt = Some(at);
    }
}

/// Exécute un plan de requêtes et normalise le résultat
///
/// Fan-out : toutes les requêtes partent en parallèle ; l'échec d'un
/// symbole devient une ligne { symbol, error } sans faire échouer le lot.
pub async fn execute_plan(
    client: &dyn HttpFetch,
    plan: &RequestPlan,
    config: &WidgetConfig,
) -> Result<NormalizedData, FetchError> {
    match plan {
        RequestPlan::Single(request) => {
            let raw = client.get_json(request).await?;
            Ok(normalize(raw, Some(config.effective_chart_field())))
        }
        RequestPlan::FanOut(requests) => {
            let outcomes = join_all(requests.iter().map(|request| async move {
                let symbol = request.symbol.clone().unwrap_or_default();
                (symbol, client.get_json(request).await)
            }))
            .await;
            Ok(aggregate_fan_out(outcomes))
        }
    }
}

// ============================================================================
// WidgetTask
// ============================================================================

/// Tâche de rafraîchissement d'une instance de widget
///
/// Au démarrage : un fetch immédiat, puis un timer. Dropper la tâche
/// détruit l'instance et annule le timer.
pub struct WidgetTask {
    cycle: Arc<FetchCycle>,
    refresh_tx: mpsc::UnboundedSender<RefreshMode>,
    handle: JoinHandle<()>,
}

impl WidgetTask {
    /// Lance la tâche sur le runtime
    ///
    /// `initial` : politique du premier fetch (IfStale au montage, Force
    /// après un changement de configuration).
    pub fn spawn(runtime: &Handle, cycle: FetchCycle, initial: RefreshMode) -> Self {
        let cycle = Arc::new(cycle);
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        let handle = runtime.spawn(drive(Arc::clone(&cycle), initial, refresh_rx));
        Self {
            cycle,
            refresh_tx,
            handle,
        }
    }

    pub fn widget_id(&self) -> &str {
        self.cycle.widget_id()
    }

    pub fn config(&self) -> &WidgetConfig {
        self.cycle.config()
    }

    pub fn status(&self) -> CycleStatus {
        self.cycle.status()
    }

    /// Demande un refresh hors timer (false si la tâche est arrêtée)
    pub fn refresh(&self, mode: RefreshMode) -> bool {
        self.refresh_tx.send(mode).is_ok()
    }
}

impl Drop for WidgetTask {
    fn drop(&mut self) {
        self.cycle.teardown();
        self.handle.abort();
    }
}

/// Boucle de la tâche
///
/// Le timer est réarmé à la fin de chaque cycle qu'il déclenche : un tick
/// tombe toujours après la fenêtre de fraîcheur du fetch précédent.
async fn drive(
    cycle: Arc<FetchCycle>,
    initial: RefreshMode,
    mut refresh_rx: mpsc::UnboundedReceiver<RefreshMode>,
) {
    let period = cycle.period();
    debug!(widget = %cycle.widget_id(), period_secs = period.as_secs(), "Widget cycle started");

    cycle.run(initial, Utc::now()).await;

    let timer = sleep(period);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            () = &mut timer => {
                cycle.run(RefreshMode::IfStale, Utc::now()).await;
                timer.as_mut().reset(Instant::now() + period);
            }
            request = refresh_rx.recv() => match request {
                Some(mode) => {
                    cycle.run(mode, Utc::now()).await;
                }
                None => break,
            },
        }
    }

    debug!(widget = %cycle.widget_id(), "Widget cycle stopped");
}

// ============================================================================
// CycleSupervisor
// ============================================================================

/// Maintient une tâche par widget du store
pub struct CycleSupervisor {
    runtime: Handle,
    store: WidgetStore,
    client: Arc<dyn HttpFetch>,
    tasks: HashMap<String, WidgetTask>,
}

impl CycleSupervisor {
    pub fn new(runtime: Handle, store: WidgetStore, client: Arc<dyn HttpFetch>) -> Self {
        Self {
            runtime,
            store,
            client,
            tasks: HashMap::new(),
        }
    }

    /// Aligne les tâches sur le contenu du store
    ///
    /// - widget supprimé : tâche détruite
    /// - nouveau widget : tâche lancée (premier fetch IfStale)
    /// - configuration modifiée : ancienne tâche détruite AVANT le
    ///   lancement de la nouvelle (premier fetch Force)
    ///
    /// Retourne le nombre de tâches (re)lancées.
    pub fn sync(&mut self) -> usize {
        let widgets = self.store.widgets();

        self.tasks.retain(|id, _| {
            let keep = widgets.iter().any(|w| &w.id == id);
            if !keep {
                info!(widget = %id, "Widget removed, cycle torn down");
            }
            keep
        });

        let mut started = 0;
        for widget in &widgets {
            let initial = match self.tasks.get(&widget.id) {
                Some(task) if task.config().same_fetch_inputs(&widget.config) => continue,
                Some(_) => {
                    info!(widget = %widget.id, "Configuration changed, restarting cycle");
                    self.tasks.remove(&widget.id);
                    RefreshMode::Force
                }
                None => RefreshMode::IfStale,
            };

            let cycle = FetchCycle::new(widget, self.store.clone(), Arc::clone(&self.client));
            self.tasks
                .insert(widget.id.clone(), WidgetTask::spawn(&self.runtime, cycle, initial));
            started += 1;
        }
        started
    }

    /// Refresh manuel d'un widget
    pub fn refresh(&self, id: &str, mode: RefreshMode) -> bool {
        self.tasks.get(id).is_some_and(|task| task.refresh(mode))
    }

    /// État d'un widget
    pub fn status(&self, id: &str) -> Option<CycleStatus> {
        self.tasks.get(id).map(WidgetTask::status)
    }

    /// État de tous les widgets, par id
    pub fn statuses(&self) -> HashMap<String, CycleStatus> {
        self.tasks
            .iter()
            .map(|(id, task)| (id.clone(), task.status()))
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    /// Détruit toutes les tâches
    pub fn shutdown(&mut self) {
        info!(tasks = self.tasks.len(), "Stopping all widget cycles");
        self.tasks.clear();
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
