use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use api_types::AccountId;
use api_types::item::{Item, ItemId};
use chrono::{DateTime, Local};
use controller::{Controller, ControllerError};
use crossterm::event::{self, Event, KeyEvent};
use rpc::RpcLedger;
use tokio::sync::{mpsc, watch};

use crate::{
    config::AppConfig,
    error::{AppError, Result},
    ui::{self, keymap::AppAction},
    wallet::WalletProvider,
};

type TaskController = Controller<RpcLedger, Arc<WalletProvider>>;

/// Local input focus. The edit session itself lives in the controller; this
/// only decides whether plain characters type into the new-item line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Compose,
}

/// Snapshot handed to the renderer each frame.
pub struct ViewState {
    pub account: Option<AccountId>,
    pub items: Vec<Item>,
    pub busy: bool,
    pub last_error: Option<String>,
    pub editing: Option<(ItemId, String)>,
    pub mode: Mode,
    pub input: String,
    pub selected: usize,
    pub last_refresh: Option<DateTime<Local>>,
}

pub struct App {
    controller: Arc<TaskController>,
    wallet: Arc<WalletProvider>,
    revision: watch::Receiver<u64>,
    /// Compose text handed back by a failed create; the event loop puts it
    /// back into the input line.
    returned_input: mpsc::UnboundedReceiver<String>,
    returned_input_tx: mpsc::UnboundedSender<String>,
    mode: Mode,
    input: String,
    selected: usize,
    was_busy: bool,
    last_refresh: Option<DateTime<Local>>,
    should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let contract = AccountId::parse(&config.contract).map_err(AppError::Account)?;
        let accounts = config
            .accounts
            .iter()
            .map(|raw| AccountId::parse(raw))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(AppError::Account)?;

        let ledger = RpcLedger::new(&config.endpoint, contract)
            .map_err(|err| AppError::Endpoint(err.to_string()))?;
        let wallet = Arc::new(WalletProvider::new(accounts));
        let controller = Arc::new(Controller::new(ledger, Arc::clone(&wallet)));
        let revision = controller.subscribe();
        let (returned_input_tx, returned_input) = mpsc::unbounded_channel();

        Ok(Self {
            controller,
            wallet,
            revision,
            returned_input,
            returned_input_tx,
            mode: Mode::Browse,
            input: String::new(),
            selected: 0,
            was_busy: false,
            last_refresh: None,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ratatui::init();
        self.spawn(|controller| async move { controller.connect().await });
        let result = self.event_loop(&mut terminal).await;
        ratatui::restore();
        result
    }

    /// Commands run detached so the loop keeps drawing while the ledger
    /// round-trips; failures come back through the controller's error
    /// channel, not through the join handle.
    fn spawn<F, Fut>(&self, command: F)
    where
        F: FnOnce(Arc<TaskController>) -> Fut,
        Fut: Future<Output = std::result::Result<(), ControllerError>> + Send + 'static,
    {
        let fut = command(Arc::clone(&self.controller));
        tokio::spawn(async move {
            let _ = fut.await;
        });
    }

    async fn event_loop(&mut self, terminal: &mut ratatui::DefaultTerminal) -> Result<()> {
        let tick_rate = Duration::from_millis(200);
        let mut redraw = true;

        while !self.should_quit {
            // Absorb wallet switches; the controller reloads when idle.
            let _ = self.controller.sync_identity().await;

            if self.restore_returned_input() {
                redraw = true;
            }

            if self.revision.has_changed().unwrap_or(false) {
                self.revision.borrow_and_update();
                redraw = true;
            }

            let busy = self.controller.busy();
            if self.was_busy && !busy {
                self.last_refresh = Some(Local::now());
                redraw = true;
            }
            self.was_busy = busy;

            if redraw {
                let view = self.view();
                terminal
                    .draw(|frame| ui::render(frame, &view))
                    .map_err(|err| AppError::Terminal(err.to_string()))?;
                redraw = false;
            }

            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Key(key) => {
                        self.handle_key(key);
                        redraw = true;
                    }
                    Event::Resize(_, _) => {
                        redraw = true;
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }

    fn view(&mut self) -> ViewState {
        let items = self.controller.items();
        if self.selected >= items.len() {
            self.selected = items.len().saturating_sub(1);
        }
        ViewState {
            account: self.controller.account(),
            busy: self.controller.busy(),
            last_error: self.controller.last_error(),
            editing: self.controller.editing(),
            mode: self.mode,
            input: self.input.clone(),
            selected: self.selected,
            last_refresh: self.last_refresh,
            items,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let action = ui::keymap::map_key(key);
        if action == AppAction::Quit {
            self.should_quit = true;
            return;
        }

        if self.controller.account().is_none() {
            self.handle_connect_key(action);
        } else if self.controller.editing().is_some() {
            self.handle_edit_key(action);
        } else if self.mode == Mode::Compose {
            self.handle_compose_key(action);
        } else {
            self.handle_browse_key(action);
        }
    }

    fn handle_connect_key(&mut self, action: AppAction) {
        match action {
            AppAction::Input('r') | AppAction::Input('R') => {
                if !self.controller.busy() {
                    self.spawn(|controller| async move { controller.connect().await });
                }
            }
            AppAction::Input('w') | AppAction::Input('W') => self.wallet.cycle(),
            AppAction::Input('q') | AppAction::Input('Q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_browse_key(&mut self, action: AppAction) {
        match action {
            AppAction::Input('q') | AppAction::Input('Q') => self.should_quit = true,
            AppAction::Up | AppAction::Input('k') | AppAction::Input('K') => self.select_prev(),
            AppAction::Down | AppAction::Input('j') | AppAction::Input('J') => self.select_next(),
            AppAction::Input('a') | AppAction::Input('A') => self.mode = Mode::Compose,
            AppAction::Input('e') | AppAction::Input('E') => self.edit_selected(),
            AppAction::Input('t') | AppAction::Input('T') | AppAction::Input(' ') => {
                self.toggle_selected();
            }
            AppAction::Input('d') | AppAction::Input('D') => self.delete_selected(),
            AppAction::Input('w') | AppAction::Input('W') => self.wallet.cycle(),
            AppAction::Input('r') | AppAction::Input('R') => {
                if !self.controller.busy() {
                    self.spawn(|controller| async move { controller.refresh().await });
                }
            }
            _ => {}
        }
    }

    fn handle_compose_key(&mut self, action: AppAction) {
        match action {
            AppAction::Cancel => {
                self.input.clear();
                self.mode = Mode::Browse;
            }
            AppAction::Backspace => {
                self.input.pop();
            }
            AppAction::Submit => self.submit_new_item(),
            AppAction::Input(ch) => self.input.push(ch),
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, action: AppAction) {
        match action {
            AppAction::Cancel => self.controller.cancel_edit(),
            AppAction::Backspace => {
                if let Some((_, mut draft)) = self.controller.editing() {
                    draft.pop();
                    self.controller.set_draft(draft);
                }
            }
            AppAction::Submit => {
                if !self.controller.busy() {
                    self.spawn(|controller| async move { controller.commit_edit().await });
                }
            }
            AppAction::Input(ch) => {
                if let Some((_, mut draft)) = self.controller.editing() {
                    draft.push(ch);
                    self.controller.set_draft(draft);
                }
            }
            _ => {}
        }
    }

    /// Sends the compose line to the ledger. The input clears right away so
    /// the list stays usable while the write round-trips; a failed create
    /// hands the text back through [`App::restore_returned_input`].
    fn submit_new_item(&mut self) {
        if self.controller.busy() || self.input.trim().is_empty() {
            return;
        }
        let content = std::mem::take(&mut self.input);
        self.mode = Mode::Browse;
        let returns = self.returned_input_tx.clone();
        self.spawn(move |controller| async move {
            let result = controller.create_item(&content).await;
            if result.is_err() {
                let _ = returns.send(content);
            }
            result
        });
    }

    /// Puts the text of a failed create back into the compose line, unless
    /// the user has already started typing something else.
    fn restore_returned_input(&mut self) -> bool {
        let mut restored = false;
        while let Ok(content) = self.returned_input.try_recv() {
            if self.input.is_empty() {
                self.input = content;
                self.mode = Mode::Compose;
                restored = true;
            }
        }
        restored
    }

    fn edit_selected(&mut self) {
        if let Some(item) = self.selected_item() {
            self.controller.start_edit(&item);
        }
    }

    fn toggle_selected(&mut self) {
        if self.controller.busy() {
            return;
        }
        if let Some(item) = self.selected_item() {
            let id = item.id.clone();
            self.spawn(move |controller| async move { controller.toggle_completion(&id).await });
        }
    }

    fn delete_selected(&mut self) {
        if self.controller.busy() {
            return;
        }
        if let Some(item) = self.selected_item() {
            let id = item.id.clone();
            self.spawn(move |controller| async move { controller.delete_item(&id).await });
        }
    }

    fn selected_item(&self) -> Option<Item> {
        self.controller.items().get(self.selected).cloned()
    }

    fn select_next(&mut self) {
        let len = self.controller.items().len();
        if len == 0 {
            return;
        }
        self.selected = (self.selected + 1).min(len - 1);
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}
