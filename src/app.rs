// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état de l'application TUI : écran courant, sélection, confirmations
// et formulaire d'ajout / édition.
//
// Les widgets eux-mêmes vivent dans le WidgetStore ; App en garde un
// snapshot rafraîchi à chaque itération de la boucle, avec l'état local
// des cycles de fetch (phase, erreur transitoire).
//
// PATTERN : "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// ============================================================================

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::cycle::{CycleStatus, RefreshMode};
use crate::models::{Widget, WidgetDraft, PRESETS};
use crate::store::WidgetStore;

// ============================================================================
// Enum : Screen
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : liste des widgets + détail du widget sélectionné
    Dashboard,

    /// Formulaire d'ajout / édition (modal)
    Form,
}

/// Thème de la session (jamais persisté)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

// ============================================================================
// Formulaire
// ============================================================================

/// Champs du formulaire, dans l'ordre de navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Preset,
    Name,
    ApiUrl,
    ApiKey,
    Interval,
    Layout,
    Symbols,
    ChartField,
    Headers,
}

impl FormField {
    pub const ALL: [FormField; 9] = [
        FormField::Preset,
        FormField::Name,
        FormField::ApiUrl,
        FormField::ApiKey,
        FormField::Interval,
        FormField::Layout,
        FormField::Symbols,
        FormField::ChartField,
        FormField::Headers,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Preset => "Preset",
            FormField::Name => "Name",
            FormField::ApiUrl => "API URL",
            FormField::ApiKey => "API key",
            FormField::Interval => "Interval (s)",
            FormField::Layout => "Layout",
            FormField::Symbols => "Symbols",
            FormField::ChartField => "Chart field",
            FormField::Headers => "Headers",
        }
    }

    /// Champ à choix (←/→) plutôt que texte libre
    pub fn is_choice(self) -> bool {
        matches!(self, FormField::Preset | FormField::Layout)
    }

    fn position(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Formulaire d'ajout / édition d'un widget
#[derive(Debug, Clone)]
pub struct WidgetForm {
    pub draft: WidgetDraft,
    pub focus: FormField,

    /// Id du widget édité (None : ajout)
    pub editing: Option<String>,

    /// Headers en texte "Nom: valeur; Nom2: valeur2"
    pub headers_text: String,

    /// Dernière erreur de validation
    pub error: Option<String>,
}

impl WidgetForm {
    /// Formulaire d'ajout vide
    pub fn add() -> Self {
        Self {
            draft: WidgetDraft::new(),
            focus: FormField::Preset,
            editing: None,
            headers_text: String::new(),
            error: None,
        }
    }

    /// Formulaire d'édition prérempli
    pub fn edit(widget: &Widget) -> Self {
        let draft = WidgetDraft::from_config(&widget.config);
        Self {
            headers_text: draft.headers_text(),
            draft,
            focus: FormField::Name,
            editing: Some(widget.id.clone()),
            error: None,
        }
    }

    pub fn title(&self) -> &'static str {
        if self.editing.is_some() {
            " Edit widget "
        } else {
            " Add widget "
        }
    }

    /// Valeur affichée d'un champ
    pub fn value(&self, field: FormField) -> String {
        match field {
            FormField::Preset => self
                .draft
                .preset_id
                .as_deref()
                .and_then(crate::models::find_preset)
                .map(|preset| preset.label.to_string())
                .unwrap_or_else(|| "(none)".to_string()),
            FormField::Layout => self.draft.layout.label().to_string(),
            FormField::Headers => self.headers_text.clone(),
            text => self.text(text).map(String::clone).unwrap_or_default(),
        }
    }

    fn text(&self, field: FormField) -> Option<&String> {
        match field {
            FormField::Name => Some(&self.draft.name),
            FormField::ApiUrl => Some(&self.draft.api_url),
            FormField::ApiKey => Some(&self.draft.api_key),
            FormField::Interval => Some(&self.draft.interval),
            FormField::Symbols => Some(&self.draft.symbols),
            FormField::ChartField => Some(&self.draft.chart_field),
            FormField::Headers => Some(&self.headers_text),
            FormField::Preset | FormField::Layout => None,
        }
    }

    fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Name => Some(&mut self.draft.name),
            FormField::ApiUrl => Some(&mut self.draft.api_url),
            FormField::ApiKey => Some(&mut self.draft.api_key),
            FormField::Interval => Some(&mut self.draft.interval),
            FormField::Symbols => Some(&mut self.draft.symbols),
            FormField::ChartField => Some(&mut self.draft.chart_field),
            FormField::Headers => Some(&mut self.headers_text),
            FormField::Preset | FormField::Layout => None,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_previous(&mut self) {
        self.focus = self.focus.previous();
    }

    /// Ajoute un caractère au champ texte courant
    pub fn push_char(&mut self, c: char) {
        if let Some(text) = self.text_mut(self.focus) {
            text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(text) = self.text_mut(self.focus) {
            text.pop();
        }
    }

    /// Fait défiler les choix du champ courant (preset ou layout)
    ///
    /// Choisir un preset recopie son URL, son layout et ses headers ;
    /// "(none)" retire le preset sans vider les champs.
    pub fn cycle_choice(&mut self, forward: bool) {
        match self.focus {
            FormField::Layout => {
                self.draft.layout = if forward {
                    self.draft.layout.next()
                } else {
                    self.draft.layout.previous()
                };
            }
            FormField::Preset => {
                // 0 = aucun preset, 1..=N = PRESETS[i - 1]
                let count = PRESETS.len() + 1;
                let current = self
                    .draft
                    .preset_id
                    .as_deref()
                    .and_then(|id| PRESETS.iter().position(|p| p.id == id))
                    .map_or(0, |i| i + 1);
                let target = if forward {
                    (current + 1) % count
                } else {
                    (current + count - 1) % count
                };

                match target.checked_sub(1).and_then(|i| PRESETS.get(i)) {
                    None => self.draft.clear_preset(),
                    Some(preset) => match self.draft.apply_preset(preset.id) {
                        Ok(()) => self.headers_text = self.draft.headers_text(),
                        Err(e) => self.error = Some(e.to_string()),
                    },
                }
            }
            _ => {}
        }
    }

    /// Valide le formulaire
    ///
    /// En cas d'erreur, le message est gardé pour l'affichage et le
    /// formulaire reste ouvert.
    pub fn submit(&mut self) -> Option<crate::models::WidgetConfig> {
        self.draft.set_headers_text(&self.headers_text);
        match self.draft.into_config() {
            Ok(config) => {
                self.error = None;
                Some(config)
            }
            Err(e) => {
                debug!(error = %e, "Widget form rejected");
                self.error = Some(e.to_string());
                None
            }
        }
    }
}

// ============================================================================
// App
// ============================================================================

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Écran actuellement affiché
    pub current_screen: Screen,

    /// Index du widget sélectionné
    pub selected_index: usize,

    /// Two-step quit : première pression de 'q' => true
    pub confirm_quit: bool,

    /// Two-step delete : première pression de 'd' => true
    pub confirm_delete: bool,

    pub theme: Theme,

    /// Formulaire ouvert (écran Form)
    pub form: Option<WidgetForm>,

    /// Snapshot ordonné des widgets du store
    pub widgets: Vec<Widget>,

    /// État local des cycles, par id de widget
    pub statuses: HashMap<String, CycleStatus>,

    store: WidgetStore,

    /// Demandes de refresh en attente, consommées par la boucle principale
    pending_refresh: Vec<(String, RefreshMode)>,
}

impl App {
    /// Crée l'état de l'application sur un store
    pub fn new(store: WidgetStore) -> Self {
        let widgets = store.widgets();
        Self {
            running: true,
            current_screen: Screen::Dashboard,
            selected_index: 0,
            confirm_quit: false,
            confirm_delete: false,
            theme: Theme::default(),
            form: None,
            widgets,
            statuses: HashMap::new(),
            store,
            pending_refresh: Vec::new(),
        }
    }

    /// Rafraîchit le snapshot depuis le store et l'état des cycles
    pub fn refresh_snapshot(&mut self, statuses: HashMap<String, CycleStatus>) {
        self.widgets = self.store.widgets();
        self.statuses = statuses;
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let max_index = self.widgets.len().saturating_sub(1);
        self.selected_index = self.selected_index.min(max_index);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_on_dashboard(&self) -> bool {
        self.current_screen == Screen::Dashboard
    }

    pub fn is_in_form(&self) -> bool {
        self.current_screen == Screen::Form
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn navigate_down(&mut self) {
        let max_index = self.widgets.len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);
    }

    pub fn selected_widget(&self) -> Option<&Widget> {
        self.widgets.get(self.selected_index)
    }

    pub fn status_of(&self, id: &str) -> Option<&CycleStatus> {
        self.statuses.get(id)
    }

    /// Déplace le widget sélectionné ; la sélection le suit
    pub fn move_selected(&mut self, delta: isize) {
        let Some(id) = self.selected_widget().map(|w| w.id.clone()) else {
            return;
        };
        if self.store.move_widget(&id, delta) {
            self.widgets = self.store.widgets();
            if let Some(index) = self.widgets.iter().position(|w| w.id == id) {
                self.selected_index = index;
            }
            debug!(widget = %id, delta, "Widget moved");
        }
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        debug!(theme = self.theme.label(), "Theme toggled");
    }

    // ========================================================================
    // Confirmations (two-step)
    // ========================================================================

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    pub fn request_delete(&mut self) {
        self.confirm_delete = true;
    }

    pub fn cancel_delete(&mut self) {
        self.confirm_delete = false;
    }

    pub fn is_awaiting_delete_confirmation(&self) -> bool {
        self.confirm_delete
    }

    /// Supprime le widget sélectionné du store
    pub fn delete_selected(&mut self) {
        if let Some(id) = self.selected_widget().map(|w| w.id.clone()) {
            self.store.remove(&id);
            self.widgets = self.store.widgets();
            self.statuses.remove(&id);
            self.clamp_selection();
        }
        self.confirm_delete = false;
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    /// Demande un refresh du widget sélectionné
    pub fn request_refresh(&mut self, mode: RefreshMode) {
        if let Some(id) = self.selected_widget().map(|w| w.id.clone()) {
            info!(widget = %id, ?mode, "User requested refresh");
            self.pending_refresh.push((id, mode));
        }
    }

    /// Vide la file des refresh demandés
    pub fn take_refresh_requests(&mut self) -> Vec<(String, RefreshMode)> {
        std::mem::take(&mut self.pending_refresh)
    }

    // ========================================================================
    // Formulaire
    // ========================================================================

    pub fn open_add_form(&mut self) {
        self.form = Some(WidgetForm::add());
        self.current_screen = Screen::Form;
    }

    /// Ouvre l'édition du widget sélectionné (sans effet si la liste est vide)
    pub fn open_edit_form(&mut self) {
        if let Some(widget) = self.selected_widget() {
            self.form = Some(WidgetForm::edit(widget));
            self.current_screen = Screen::Form;
        }
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
        self.current_screen = Screen::Dashboard;
    }

    /// Valide le formulaire : ajoute ou met à jour le widget
    ///
    /// Retourne true si le formulaire a été fermé.
    pub fn submit_form(&mut self) -> bool {
        let Some(form) = self.form.as_mut() else {
            return false;
        };
        let Some(config) = form.submit() else {
            return false;
        };

        match form.editing.clone() {
            Some(id) => {
                if !self.store.update(&id, config) {
                    warn!(widget = %id, "Edited widget no longer exists");
                }
            }
            None => {
                self.store.add(config);
                self.widgets = self.store.widgets();
                self.selected_index = self.widgets.len().saturating_sub(1);
            }
        }

        self.widgets = self.store.widgets();
        self.cancel_form();
        true
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LayoutKind, WidgetConfig};

    fn app_with(names: &[&str]) -> App {
        let store = WidgetStore::in_memory();
        for name in names {
            store.add(WidgetConfig::new(*name, format!("https://api.test/{}", name), 30));
        }
        App::new(store)
    }

    fn names(app: &App) -> Vec<String> {
        app.widgets.iter().map(|w| w.config.name.clone()).collect()
    }

    fn type_text(form: &mut WidgetForm, text: &str) {
        for c in text.chars() {
            form.push_char(c);
        }
    }

    #[test]
    fn test_app_creation() {
        let app = app_with(&[]);
        assert!(app.is_running());
        assert!(app.widgets.is_empty());
        assert!(app.is_on_dashboard());
        assert_eq!(app.theme, Theme::Dark);
    }

    #[test]
    fn test_navigation() {
        let mut app = app_with(&["a", "b", "c"]);

        app.navigate_down();
        app.navigate_down();
        app.navigate_down();
        assert_eq!(app.selected_index, 2);

        app.navigate_up();
        assert_eq!(app.selected_widget().unwrap().config.name, "b");

        app.navigate_up();
        app.navigate_up();
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_two_step_delete() {
        let mut app = app_with(&["a", "b"]);
        app.navigate_down();

        app.request_delete();
        assert!(app.is_awaiting_delete_confirmation());
        app.delete_selected();

        assert!(!app.is_awaiting_delete_confirmation());
        assert_eq!(names(&app), ["a"]);
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_move_selected_follows_widget() {
        let mut app = app_with(&["a", "b", "c"]);
        app.move_selected(1);
        assert_eq!(names(&app), ["b", "a", "c"]);
        assert_eq!(app.selected_index, 1);

        app.move_selected(-1);
        assert_eq!(names(&app), ["a", "b", "c"]);
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_refresh_requests_are_queued() {
        let mut app = app_with(&["a"]);
        let id = app.widgets[0].id.clone();

        app.request_refresh(RefreshMode::IfStale);
        app.request_refresh(RefreshMode::Force);
        assert_eq!(
            app.take_refresh_requests(),
            vec![(id.clone(), RefreshMode::IfStale), (id, RefreshMode::Force)]
        );
        assert!(app.take_refresh_requests().is_empty());
    }

    #[test]
    fn test_theme_toggle() {
        let mut app = app_with(&[]);
        app.toggle_theme();
        assert_eq!(app.theme, Theme::Light);
        app.toggle_theme();
        assert_eq!(app.theme, Theme::Dark);
    }

    #[test]
    fn test_add_form_validation_and_submit() {
        let mut app = app_with(&[]);
        app.open_add_form();
        assert!(app.is_in_form());

        // URL manquante : le formulaire reste ouvert avec un message
        assert!(!app.submit_form());
        assert!(app.form.as_ref().unwrap().error.is_some());

        let form = app.form.as_mut().unwrap();
        form.focus = FormField::ApiUrl;
        type_text(form, "https://finnhub.io/api/v1/quote");
        form.focus = FormField::Symbols;
        type_text(form, "AAPL, MSFT");

        assert!(app.submit_form());
        assert!(app.is_on_dashboard());
        assert_eq!(app.widgets.len(), 1);

        let config = &app.widgets[0].config;
        assert_eq!(config.name, "Untitled Widget");
        assert_eq!(config.symbols.as_deref().unwrap(), ["AAPL", "MSFT"]);
    }

    #[test]
    fn test_preset_cycling_fills_the_draft() {
        let mut form = WidgetForm::add();
        form.cycle_choice(true);
        assert_eq!(form.draft.preset_id.as_deref(), Some(PRESETS[0].id));
        assert_eq!(form.draft.api_url, PRESETS[0].api_url);
        assert_eq!(form.value(FormField::Preset), PRESETS[0].label);

        // Retour arrière : aucun preset, URL conservée
        form.cycle_choice(false);
        assert_eq!(form.draft.preset_id, None);
        assert_eq!(form.draft.api_url, PRESETS[0].api_url);

        form.cycle_choice(false);
        assert_eq!(form.draft.preset_id.as_deref(), Some(PRESETS[PRESETS.len() - 1].id));
    }

    #[test]
    fn test_layout_choice_ignores_typing() {
        let mut form = WidgetForm::add();
        form.focus = FormField::Layout;
        form.push_char('x');
        form.cycle_choice(true);
        assert_eq!(form.draft.layout, LayoutKind::Table.next());
        assert!(FormField::Layout.is_choice());
    }

    #[test]
    fn test_edit_form_updates_in_place() {
        let mut app = app_with(&["a"]);
        let id = app.widgets[0].id.clone();

        app.open_edit_form();
        let form = app.form.as_mut().unwrap();
        assert_eq!(form.editing.as_deref(), Some(id.as_str()));
        form.focus = FormField::Interval;
        form.backspace();
        form.backspace();
        type_text(form, "60");
        form.focus = FormField::Headers;
        type_text(form, "X-Api-Key: k");

        assert!(app.submit_form());
        let widget = &app.widgets[0];
        assert_eq!(widget.id, id);
        assert_eq!(widget.config.interval, 60);
        assert_eq!(widget.config.headers.as_ref().unwrap()["X-Api-Key"], "k");
    }

    #[test]
    fn test_form_field_order_wraps() {
        assert_eq!(FormField::Headers.next(), FormField::Preset);
        assert_eq!(FormField::Preset.previous(), FormField::Headers);
        assert_eq!(FormField::Name.next(), FormField::ApiUrl);
    }
}
