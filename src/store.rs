// ============================================================================
// Widget Store
// ============================================================================
// Possède la liste ordonnée des widgets et leur dernier résultat de fetch.
// Persistée en JSON dans un slot unique, rechargée telle quelle au démarrage.
//
// CONCEPTS RUST :
// 1. Arc<Mutex<T>> : état partagé entre l'UI et les tâches de fetch
// 2. Clone bon marché : cloner le store clone l'Arc, pas les données
// 3. Mises à jour par id : chaque écriture modifie un seul widget sous le
//    verrou, jamais un remplacement de la liste depuis un état périmé
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{NormalizedData, Widget, WidgetConfig};

/// Version du format persisté (aucune migration n'est définie)
const SLOT_VERSION: u32 = 0;

/// État du tableau de bord
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct BoardState {
    widgets: Vec<Widget>,
}

/// Contenu du slot persisté : { "state": { "widgets": [...] }, "version": 0 }
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSlot {
    state: BoardState,
    #[serde(default)]
    version: u32,
}

/// Store des widgets (handle partagé)
#[derive(Debug, Clone)]
pub struct WidgetStore {
    state: Arc<Mutex<BoardState>>,
    slot: Option<Arc<PathBuf>>,
}

impl WidgetStore {
    /// Store non persisté (tests, mode éphémère)
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(Mutex::new(BoardState::default())),
            slot: None,
        }
    }

    /// Ouvre le store persisté dans `path`
    ///
    /// Fichier absent => tableau vide. Fichier illisible ou corrompu =>
    /// tableau vide (l'erreur est loggée, le fichier sera réécrit à la
    /// prochaine modification).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match load_slot(&path) {
            Ok(Some(state)) => {
                info!(path = %path.display(), widgets = state.widgets.len(), "Widget store loaded");
                state
            }
            Ok(None) => {
                info!(path = %path.display(), "No persisted widgets, starting empty");
                BoardState::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = ?e, "Failed to load widget store, starting empty");
                BoardState::default()
            }
        };

        Self {
            state: Arc::new(Mutex::new(state)),
            slot: Some(Arc::new(path)),
        }
    }

    /// Chemin du slot persisté
    pub fn slot_path(&self) -> Option<&Path> {
        self.slot.as_deref().map(PathBuf::as_path)
    }

    /// Snapshot ordonné des widgets
    pub fn widgets(&self) -> Vec<Widget> {
        self.state.lock().widgets.clone()
    }

    /// Un widget par son id
    pub fn get(&self, id: &str) -> Option<Widget> {
        self.state.lock().widgets.iter().find(|w| w.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ajoute un widget en fin de liste et retourne son id
    ///
    /// L'id est un timestamp en millisecondes, incrémenté si déjà pris.
    pub fn add(&self, config: WidgetConfig) -> String {
        let mut state = self.state.lock();

        let mut stamp = Utc::now().timestamp_millis();
        while state.widgets.iter().any(|w| w.id == stamp.to_string()) {
            stamp += 1;
        }
        let id = stamp.to_string();

        info!(widget = %id, name = %config.name, "Adding widget");
        state.widgets.push(Widget::new(id.clone(), config));
        self.persist(&state);
        id
    }

    /// Supprime un widget (false si l'id est inconnu)
    pub fn remove(&self, id: &str) -> bool {
        let mut state = self.state.lock();
        let before = state.widgets.len();
        state.widgets.retain(|w| w.id != id);

        let removed = state.widgets.len() != before;
        if removed {
            info!(widget = %id, "Widget removed");
            self.persist(&state);
        }
        removed
    }

    /// Réordonne les widgets selon une liste d'ids
    ///
    /// Les ids listés passent en tête dans cet ordre ; les widgets non
    /// listés gardent leur ordre relatif à la suite ; les ids inconnus
    /// sont ignorés. Aucun widget n'est perdu ni dupliqué.
    pub fn reorder(&self, new_order: &[String]) {
        let mut state = self.state.lock();
        let mut remaining = std::mem::take(&mut state.widgets);
        let mut ordered = Vec::with_capacity(remaining.len());

        for id in new_order {
            if let Some(index) = remaining.iter().position(|w| &w.id == id) {
                ordered.push(remaining.remove(index));
            }
        }
        ordered.append(&mut remaining);

        state.widgets = ordered;
        debug!(widgets = state.widgets.len(), "Widgets reordered");
        self.persist(&state);
    }

    /// Déplace un widget de `delta` positions (borné aux extrémités)
    ///
    /// Remplace le glisser-déposer : retourne false si rien n'a bougé.
    pub fn move_widget(&self, id: &str, delta: isize) -> bool {
        let mut order: Vec<String> = self.widgets().into_iter().map(|w| w.id).collect();
        let Some(from) = order.iter().position(|w| w == id) else {
            return false;
        };
        let last = order.len().saturating_sub(1) as isize;
        let to = (from as isize + delta).clamp(0, last) as usize;
        if to == from {
            return false;
        }

        let moved = order.remove(from);
        order.insert(to, moved);
        self.reorder(&order);
        true
    }

    /// Enregistre les dernières données d'un widget (lastUpdated = maintenant)
    pub fn update_data(&self, id: &str, data: NormalizedData) -> bool {
        self.update_data_at(id, data, Utc::now())
    }

    /// Enregistre les dernières données avec un horodatage explicite
    ///
    /// Écrase lastData et lastUpdated ensemble, jamais de fusion partielle.
    /// Retourne false si le widget n'existe plus.
    pub fn update_data_at(&self, id: &str, data: NormalizedData, at: DateTime<Utc>) -> bool {
        let mut state = self.state.lock();
        let Some(widget) = state.widgets.iter_mut().find(|w| w.id == id) else {
            debug!(widget = %id, "Data update for unknown widget ignored");
            return false;
        };

        debug!(widget = %id, shape = data.shape_label(), entries = data.len(), "Widget data updated");
        widget.last_data = Some(data);
        widget.last_updated = Some(at);
        self.persist(&state);
        true
    }

    /// Remplace la configuration d'un widget (id et dernières données conservés)
    pub fn update(&self, id: &str, config: WidgetConfig) -> bool {
        let mut state = self.state.lock();
        let Some(widget) = state.widgets.iter_mut().find(|w| w.id == id) else {
            return false;
        };

        info!(widget = %id, name = %config.name, "Widget configuration updated");
        widget.config = config;
        self.persist(&state);
        true
    }

    /// Supprime tous les widgets
    pub fn clear_all(&self) {
        let mut state = self.state.lock();
        state.widgets.clear();
        info!("All widgets cleared");
        self.persist(&state);
    }

    /// Écrit le slot (appelé sous le verrou : les écritures sont sérialisées)
    ///
    /// Un échec d'écriture est loggé et n'interrompt jamais l'appelant.
    fn persist(&self, state: &BoardState) {
        let Some(path) = self.slot.as_deref() else {
            return;
        };
        if let Err(e) = save_slot(path, state) {
            warn!(path = %path.display(), error = ?e, "Failed to persist widget store");
        }
    }
}

/// Lit le slot ; Ok(None) si le fichier n'existe pas
fn load_slot(path: &Path) -> Result<Option<BoardState>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Échec de la lecture de {}", path.display()))?;
    let slot: PersistedSlot = serde_json::from_str(&content)
        .with_context(|| format!("Contenu invalide dans {}", path.display()))?;
    Ok(Some(slot.state))
}

/// Écrit le slot via un fichier temporaire puis un rename
fn save_slot(path: &Path, state: &BoardState) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Échec de la création du répertoire de données")?;
    }

    let slot = PersistedSlot {
        state: state.clone(),
        version: SLOT_VERSION,
    };
    let content = serde_json::to_string_pretty(&slot).context("Échec de la sérialisation du store")?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).with_context(|| format!("Échec de l'écriture de {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Échec du renommage vers {}", path.display()))?;
    Ok(())
}

// ============================================================================
// Tests unitaires
// ============================================================================
