use std::sync::Arc;
use std::time::Duration;

use iced::widget::{
    button, center, checkbox, column, container, opaque, pick_list, progress_bar, row,
    scrollable, stack, text, Space,
};
use iced::{font, Color, Element, Font, Length, Task, Theme};
use tokio_util::sync::CancellationToken;

use crate::catalog::{client::fetch_config, Printer, PrinterConfig};
use crate::error::LoadError;
use crate::install::subscription::watch_batch;
use crate::install::{Batch, BatchEvent, Installer, LpAdmin};
use crate::session::Session;
use crate::settings::Settings;

/// Failure lines shown in the result dialog before the rest are summarized.
const MAX_FAILURE_LINES: usize = 5;

const BOLD: Font = Font {
    weight: font::Weight::Bold,
    ..Font::DEFAULT
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Dialog {
    title: String,
    message: String,
    is_error: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Progress {
    done: usize,
    total: usize,
}

pub struct App {
    session: Session,
    settings: Settings,
    http: reqwest::Client,
    installer: Arc<Installer>,
    status: String,
    loading: bool,
    warnings: Vec<String>,
    confirming: bool,
    progress: Option<Progress>,
    cancel: Option<CancellationToken>,
    dialog: Option<Dialog>,
}

#[derive(Debug, Clone)]
pub enum Message {
    LoadConfig,
    ConfigLoaded(Result<PrinterConfig, LoadError>),
    LocationSelected(String),
    ToggleRow(usize, bool),
    SelectAll,
    DeselectAll,
    Install,
    ConfirmInstall,
    CancelConfirm,
    CancelInstall,
    Batch(BatchEvent),
    DismissDialog,
    PrerequisitesChecked(Vec<String>),
    DismissWarning(usize),
    Exit,
}

impl App {
    /// Build the app and start the first configuration load.
    pub fn new(settings: Settings, settings_error: Option<String>) -> (Self, Task<Message>) {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {e}");
                reqwest::Client::new()
            });
        let admin = Arc::new(LpAdmin::new(&settings.lpstat_bin, &settings.lpadmin_bin));
        let installer = Arc::new(Installer::new(http.clone(), admin));

        let warnings = settings_error
            .map(|e| format!("Settings: {e} (using defaults)"))
            .into_iter()
            .collect();
        let check = check_platform(&settings);

        let mut app = Self {
            session: Session::default(),
            settings,
            http,
            installer,
            status: String::from("Ready"),
            loading: false,
            warnings,
            confirming: false,
            progress: None,
            cancel: None,
            dialog: None,
        };
        let load = app.start_load();
        (app, Task::batch([load, check]))
    }

    fn start_load(&mut self) -> Task<Message> {
        if self.loading {
            return Task::none();
        }
        self.loading = true;
        self.status = String::from("Loading configuration...");

        let client = self.http.clone();
        let url = self.settings.config_url.clone();
        Task::perform(
            async move { fetch_config(&client, &url).await },
            Message::ConfigLoaded,
        )
    }

    fn installing(&self) -> bool {
        self.progress.is_some()
    }

    fn show(&mut self, title: &str, message: String, is_error: bool) {
        self.dialog = Some(Dialog {
            title: title.to_string(),
            message,
            is_error,
        });
    }
}

fn check_platform(settings: &Settings) -> Task<Message> {
    let lpstat = settings.lpstat_bin.clone();
    let lpadmin = settings.lpadmin_bin.clone();
    Task::perform(
        async move {
            tokio::task::spawn_blocking(move || {
                crate::platform::check_prerequisites(&lpstat, &lpadmin)
            })
            .await
            .unwrap_or_default()
        },
        Message::PrerequisitesChecked,
    )
}

pub fn title(_app: &App) -> String {
    String::from("Printer Installer")
}

pub fn update(app: &mut App, message: Message) -> Task<Message> {
    match message {
        Message::LoadConfig => app.start_load(),

        Message::ConfigLoaded(result) => {
            app.loading = false;
            match app.session.apply_load(result) {
                Ok(()) => {
                    let count = app.session.locations().len();
                    if count == 0 {
                        app.status = String::from("Configuration loaded, but it has no locations");
                        app.show(
                            "No locations",
                            String::from("The configuration file does not list any locations."),
                            false,
                        );
                    } else {
                        app.status = format!("Configuration loaded: {count} location(s)");
                    }
                }
                Err(e) => {
                    tracing::warn!("Configuration load failed: {e}");
                    app.status = String::from("Failed to load configuration");
                    app.show("Could not load configuration", e.to_string(), true);
                }
            }
            Task::none()
        }

        Message::LocationSelected(location) => {
            app.session.select_location(location);
            app.status = format!("{} printer(s) available", app.session.printers().len());
            Task::none()
        }

        Message::ToggleRow(index, checked) => {
            app.session.set_checked(index, checked);
            Task::none()
        }

        Message::SelectAll => {
            app.session.check_all();
            Task::none()
        }

        Message::DeselectAll => {
            app.session.clear_checked();
            Task::none()
        }

        Message::Install => {
            if !app.installing() && app.session.checked_count() > 0 {
                app.confirming = true;
            }
            Task::none()
        }

        Message::CancelConfirm => {
            app.confirming = false;
            Task::none()
        }

        Message::ConfirmInstall => {
            app.confirming = false;
            if app.installing() {
                return Task::none();
            }
            let Some(config) = app.session.config() else {
                return Task::none();
            };
            let printers = app.session.selected_printers();
            if printers.is_empty() {
                return Task::none();
            }

            let cancel = CancellationToken::new();
            app.cancel = Some(cancel.clone());
            app.progress = Some(Progress {
                done: 0,
                total: printers.len(),
            });
            app.status = format!("Installing {} printer(s)...", printers.len());

            let batch = Batch {
                installer: app.installer.clone(),
                config,
                printers,
                policy: app.settings.policy,
                cancel,
            };
            Task::run(watch_batch(batch), Message::Batch)
        }

        Message::CancelInstall => {
            if let Some(cancel) = &app.cancel {
                cancel.cancel();
                app.status = String::from("Cancelling; printers already in progress will finish...");
            }
            Task::none()
        }

        Message::Batch(event) => {
            match event {
                BatchEvent::Started { printer } => {
                    app.status = format!("Installing {printer}...");
                }
                BatchEvent::Completed {
                    outcome,
                    done,
                    total,
                } => {
                    app.progress = Some(Progress { done, total });
                    let verb = if outcome.is_success() {
                        "Installed"
                    } else {
                        "Failed"
                    };
                    app.status = format!("{verb} {} ({done}/{total})", outcome.printer);
                }
                BatchEvent::Finished(result) => {
                    app.progress = None;
                    app.cancel = None;
                    app.status = format!(
                        "Installed {} of {} printer(s), {} failed",
                        result.succeeded,
                        result.total(),
                        result.failed()
                    );
                    app.show(
                        "Installation result",
                        result.summary(MAX_FAILURE_LINES),
                        result.failed() > 0,
                    );
                }
            }
            Task::none()
        }

        Message::DismissDialog => {
            app.dialog = None;
            Task::none()
        }

        Message::PrerequisitesChecked(warnings) => {
            for warning in &warnings {
                tracing::warn!("{warning}");
            }
            app.warnings.extend(warnings);
            Task::none()
        }

        Message::DismissWarning(idx) => {
            if idx < app.warnings.len() {
                app.warnings.remove(idx);
            }
            Task::none()
        }

        Message::Exit => iced::exit(),
    }
}

pub fn view(app: &App) -> Element<'_, Message> {
    let header = column![
        text("Printer Installer")
            .size(28)
            .font(BOLD)
            .color(crate::theme::PRIMARY),
        text(&app.settings.config_url)
            .size(11)
            .color(crate::theme::MUTED),
    ]
    .spacing(4)
    .align_x(iced::Alignment::Center)
    .width(Length::Fill);

    let refresh = button(text("Refresh").size(13))
        .on_press_maybe((!app.loading).then_some(Message::LoadConfig))
        .padding([6, 14]);

    let location_bar = row![
        text("Location:").size(14).font(BOLD),
        pick_list(
            app.session.locations(),
            app.session.location().map(str::to_string),
            Message::LocationSelected,
        )
        .placeholder("Choose your office...")
        .width(Length::Fill),
        refresh,
    ]
    .spacing(10)
    .align_y(iced::Alignment::Center);

    let warnings_section: Element<'_, Message> = if app.warnings.is_empty() {
        Space::new(0, 0).into()
    } else {
        column(
            app.warnings
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    row![
                        text(w).size(11).color(crate::theme::WARNING),
                        button(text("x").size(10))
                            .on_press(Message::DismissWarning(i))
                            .padding(2),
                    ]
                    .spacing(5)
                    .into()
                })
                .collect::<Vec<_>>(),
        )
        .spacing(2)
        .into()
    };

    let printers = app.session.printers();
    let printer_list: Element<'_, Message> = if printers.is_empty() {
        let hint = if app.loading {
            "Loading..."
        } else {
            "No printers at this location."
        };
        center(text(hint).size(13).color(crate::theme::MUTED)).into()
    } else {
        scrollable(
            column(
                printers
                    .iter()
                    .enumerate()
                    .map(|(i, printer)| printer_row(app, i, printer))
                    .collect::<Vec<_>>(),
            )
            .spacing(6)
            .padding(8),
        )
        .height(Length::Fill)
        .into()
    };

    let list_panel = container(printer_list)
        .width(Length::Fill)
        .height(Length::Fill)
        .style(|_: &Theme| container::Style {
            background: Some(Color::WHITE.into()),
            border: iced::Border {
                color: Color::from_rgb(0.85, 0.85, 0.87),
                width: 1.0,
                radius: 6.0.into(),
            },
            ..Default::default()
        });

    let selection_bar = row![
        button(text("Select all").size(12))
            .on_press_maybe((!printers.is_empty()).then_some(Message::SelectAll))
            .padding([4, 12]),
        button(text("Select none").size(12))
            .on_press(Message::DeselectAll)
            .padding([4, 12]),
    ]
    .spacing(8);

    let progress_section: Element<'_, Message> = match app.progress {
        Some(Progress { done, total }) => row![
            progress_bar(0.0..=total.max(1) as f32, done as f32).height(12),
            button(text("Cancel").size(12))
                .on_press_maybe(
                    app.cancel
                        .as_ref()
                        .filter(|c| !c.is_cancelled())
                        .map(|_| Message::CancelInstall),
                )
                .padding([2, 10]),
        ]
        .spacing(10)
        .align_y(iced::Alignment::Center)
        .into(),
        None => Space::new(0, 0).into(),
    };

    let selected = app.session.checked_count();
    let install_label = if selected > 0 {
        format!("Install selected printers ({selected})")
    } else {
        String::from("Install selected printers")
    };
    let install_btn = button(text(install_label).size(13))
        .on_press_maybe((selected > 0 && !app.installing()).then_some(Message::Install))
        .padding([6, 20]);

    let bottom_bar = row![
        text(&app.status).size(13),
        Space::with_width(Length::Fill),
        install_btn,
        button(text("Exit").size(13))
            .on_press(Message::Exit)
            .padding([6, 20]),
    ]
    .spacing(10)
    .align_y(iced::Alignment::Center);

    let content = container(
        column![
            header,
            location_bar,
            warnings_section,
            list_panel,
            selection_bar,
            progress_section,
            bottom_bar,
        ]
        .spacing(10),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .padding(16);

    if let Some(dialog) = &app.dialog {
        let title_color = if dialog.is_error {
            crate::theme::DANGER
        } else {
            crate::theme::HEADER
        };
        let card = column![
            text(&dialog.title).size(18).font(BOLD).color(title_color),
            scrollable(text(&dialog.message).size(13)).height(Length::Shrink),
            button(text("OK").size(13))
                .on_press(Message::DismissDialog)
                .padding([6, 24]),
        ]
        .spacing(12);
        modal(content, card)
    } else if app.confirming {
        let card = column![
            text("Confirm installation").size(18).font(BOLD),
            text(format!("Install {selected} printer(s)?")).size(15),
            row![
                button(text("Cancel").size(13))
                    .on_press(Message::CancelConfirm)
                    .padding([6, 20]),
                button(text("Install").size(13))
                    .on_press(Message::ConfirmInstall)
                    .padding([6, 20]),
            ]
            .spacing(12),
        ]
        .spacing(12);
        modal(content, card)
    } else {
        content.into()
    }
}

fn printer_row<'a>(app: &App, index: usize, printer: &'a Printer) -> Element<'a, Message> {
    let details = format!(
        "{} - {}",
        printer.model,
        printer
            .explicit_uri()
            .or(printer.address())
            .unwrap_or("no address")
    );

    row![
        checkbox("", app.session.is_checked(index))
            .on_toggle(move |checked| Message::ToggleRow(index, checked)),
        column![
            text(&printer.name)
                .size(16)
                .font(BOLD)
                .color(crate::theme::HEADER),
            text(details).size(12).color(crate::theme::MUTED),
        ]
        .spacing(2),
    ]
    .spacing(8)
    .align_y(iced::Alignment::Center)
    .into()
}

/// Show `content` in a card above a dimmed `base`.
fn modal<'a>(
    base: impl Into<Element<'a, Message>>,
    content: impl Into<Element<'a, Message>>,
) -> Element<'a, Message> {
    let card = container(content)
        .width(420)
        .padding(20)
        .style(|_: &Theme| container::Style {
            background: Some(Color::WHITE.into()),
            border: iced::Border {
                color: Color::from_rgb(0.85, 0.85, 0.87),
                width: 1.0,
                radius: 8.0.into(),
            },
            ..Default::default()
        });

    stack![
        base.into(),
        opaque(center(opaque(card)).style(|_: &Theme| container::Style {
            background: Some(
                Color {
                    a: 0.5,
                    ..Color::BLACK
                }
                .into()
            ),
            ..Default::default()
        }))
    ]
    .into()
}

pub fn theme(_app: &App) -> Theme {
    crate::theme::light()
}
