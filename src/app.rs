use crate::config::AppConfig;
use crate::grid::{self, GridCell};
use crate::options::{GridColor, OptionFields};
use crate::record::{ConfirmOverwrite, PendingLabel, SaveOutcome};
use crate::session::{RenderInstruction, SessionController, SessionError};
use eframe::egui;
use std::path::{Path, PathBuf};

const HIGHLIGHT: egui::Color32 = egui::Color32::from_rgba_premultiplied(77, 20, 20, 77);

// ── Dialogs ─────────────────────────────────────────────────────────────────

/// Same-label overwrite question, asked with a native message box.
struct DialogConfirm;

impl ConfirmOverwrite for DialogConfirm {
    fn confirm_overwrite(&mut self, path: &Path) -> bool {
        let answer = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Warning)
            .set_title("Labeler")
            .set_description(format!(
                "File already exists. Continue?\n{}",
                path.display()
            ))
            .set_buttons(rfd::MessageButtons::YesNo)
            .show();
        matches!(answer, rfd::MessageDialogResult::Yes)
    }
}

fn show_info(message: &str) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Info)
        .set_title("Labeler")
        .set_description(message)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

struct LabelPrompt {
    pending: PendingLabel,
    text: String,
}

// ── App ─────────────────────────────────────────────────────────────────────

pub struct TilesApp {
    session: SessionController,
    config: AppConfig,
    config_path: Option<PathBuf>,

    texture: Option<egui::TextureHandle>,
    fields: OptionFields,
    label_prompt: Option<LabelPrompt>,
    status: String,
    hover: Option<egui::Pos2>,

    // pan & zoom
    pan: egui::Vec2,
    zoom: f32,
    panning: bool,
}

impl TilesApp {
    pub fn new(config: AppConfig, config_path: Option<PathBuf>, folder: Option<PathBuf>) -> Self {
        let session = SessionController::new(config.display.clone(), config.save_dir.clone());
        let fields = config.display.to_fields();
        let mut app = Self {
            session,
            config,
            config_path,
            texture: None,
            fields,
            label_prompt: None,
            status: "Select an image folder to start.".to_string(),
            hover: None,
            pan: egui::Vec2::ZERO,
            zoom: 1.0,
            panning: false,
        };
        if let Some(dir) = folder {
            app.open_folder(&dir);
        }
        app
    }

    fn image_size(&self) -> egui::Vec2 {
        self.session
            .image()
            .map(|img| egui::vec2(img.width() as f32, img.height() as f32))
            .unwrap_or(egui::Vec2::ZERO)
    }

    /// Convert image-space coords to screen-space
    fn image_to_screen(&self, canvas_rect: egui::Rect, img_pos: egui::Pos2) -> egui::Pos2 {
        canvas_rect.center() + self.pan + (img_pos.to_vec2() - self.image_size() * 0.5) * self.zoom
    }

    /// Convert screen-space coords to image-space
    fn screen_to_image(&self, canvas_rect: egui::Rect, screen_pos: egui::Pos2) -> egui::Pos2 {
        let rel = screen_pos - canvas_rect.center() - self.pan;
        (rel / self.zoom + self.image_size() * 0.5).to_pos2()
    }

    fn on_image(&self, img_pos: egui::Pos2) -> bool {
        self.session
            .image()
            .is_some_and(|img| img.contains(img_pos.x as f64, img_pos.y as f64))
    }

    fn cell_on_screen(&self, canvas_rect: egui::Rect, cell: &GridCell) -> egui::Rect {
        egui::Rect::from_min_max(
            self.image_to_screen(canvas_rect, egui::pos2(cell.xmin as f32, cell.ymin as f32)),
            self.image_to_screen(canvas_rect, egui::pos2(cell.xmax as f32, cell.ymax as f32)),
        )
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() {
            return;
        }
        if let Some(img) = self.session.image() {
            let rgba = img.display();
            let size = [rgba.width() as usize, rgba.height() as usize];
            let color_image =
                egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_flat_samples().as_slice());
            self.texture = Some(ctx.load_texture("image", color_image, egui::TextureOptions::LINEAR));
        }
    }

    fn apply(&mut self, instruction: RenderInstruction) {
        match instruction {
            RenderInstruction::Redraw => self.texture = None,
            // Highlights are painted from the selection every frame.
            RenderInstruction::Highlight { .. } | RenderInstruction::Unchanged => {}
        }
    }

    fn report(&mut self, err: SessionError) {
        log::error!("{err}");
        self.status = err.to_string();
    }

    fn persist_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.config.save(path) {
            log::warn!("Could not save configuration: {e}");
        }
    }

    fn open_folder(&mut self, dir: &Path) {
        match self.session.open_folder(dir) {
            Ok(instruction) => {
                self.apply(instruction);
                self.pan = egui::Vec2::ZERO;
                self.update_status();
                self.config.last_folder = Some(dir.to_path_buf());
                self.persist_config();
            }
            Err(e) => self.report(e),
        }
    }

    fn select_folder(&mut self) {
        let start = self
            .config
            .last_folder
            .clone()
            .unwrap_or_else(|| PathBuf::from("./"));
        if let Some(dir) = rfd::FileDialog::new()
            .set_title("Select an Image Folder")
            .set_directory(start)
            .pick_folder()
        {
            self.open_folder(&dir);
        }
    }

    fn select_save_dir(&mut self) {
        if let Some(dir) = rfd::FileDialog::new()
            .set_title("Select a Saving directory")
            .set_directory(self.session.save_dir())
            .pick_folder()
        {
            self.config.save_dir = Some(dir.clone());
            self.session.set_save_dir(dir);
            self.persist_config();
            self.update_status();
        }
    }

    fn navigate(&mut self, step: isize) {
        match self.session.navigate(step) {
            Ok(instruction) => {
                self.apply(instruction);
                self.update_status();
            }
            Err(e) => self.report(e),
        }
    }

    fn commit_options(&mut self) {
        let instruction = self.session.commit_options(&self.fields);
        self.apply(instruction);
        // Show what was actually applied after any fallback.
        self.fields = self.session.options().to_fields();
        self.config.display = self.session.options().clone();
        self.persist_config();
    }

    fn open_label_prompt(&mut self) {
        if let Some(pending) = self.session.prepare_label() {
            self.label_prompt = Some(LabelPrompt {
                pending,
                text: String::new(),
            });
        }
    }

    fn save_label(&mut self, prompt: &LabelPrompt) {
        match self
            .session
            .save_label(&prompt.pending, &prompt.text, &mut DialogConfirm)
        {
            Ok(SaveOutcome::Declined) => {
                self.status = "Save cancelled.".to_string();
            }
            Ok(outcome) => {
                if let Some(path) = outcome.written_path() {
                    self.status = format!("Saved {}", path.display());
                }
                show_info("Label saved!");
            }
            Err(e) => self.report(e),
        }
    }

    fn update_status(&mut self) {
        let Some(image) = self.session.image() else {
            return;
        };
        let position = self
            .session
            .navigator()
            .map(|nav| format!("{}/{}", nav.active_index() + 1, nav.len()))
            .unwrap_or_default();
        self.status = format!(
            "{position}  {}  →  {}",
            image.path.display(),
            self.session.save_dir().display()
        );
    }

    fn draw_overlay(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        for cell in self.session.selection().iter() {
            painter.rect_filled(self.cell_on_screen(canvas_rect, cell), 0.0, HIGHLIGHT);
        }

        let options = self.session.options();
        let Some(image) = self.session.image() else {
            return;
        };
        if options.show_cell_labels {
            let font = egui::FontId::proportional((12.0 * self.zoom).clamp(6.0, 32.0));
            for label in grid::cell_labels(options.interval(), image.width(), image.height()) {
                painter.text(
                    self.image_to_screen(canvas_rect, egui::pos2(label.center_x, label.center_y)),
                    egui::Align2::CENTER_CENTER,
                    label.index.to_string(),
                    font.clone(),
                    egui::Color32::WHITE,
                );
            }
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Select an image folder").clicked() {
                self.select_folder();
            }
            if ui.button("Select a saving directory").clicked() {
                self.select_save_dir();
            }
            ui.separator();
            if ui.button("Back").clicked() {
                self.navigate(-1);
            }
            if ui.button("Next").clicked() {
                self.navigate(1);
            }
            if ui.button("Reset").clicked() {
                let instruction = self.session.reset();
                self.apply(instruction);
            }
            ui.separator();
            ui.label(format!("Zoom: {:.0}%", self.zoom * 100.0));
            if let Some(pos) = self.hover {
                ui.separator();
                ui.monospace(format!("{:.2} {:.2}", pos.x, pos.y));
            }
        });
    }

    fn option_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Grid Intervals: (x,y)");
            ui.add(egui::TextEdit::singleline(&mut self.fields.intervals).desired_width(80.0));
            ui.separator();
            egui::ComboBox::from_label("Grid Color")
                .selected_text(self.fields.color.map(|c| c.name()).unwrap_or(""))
                .show_ui(ui, |ui| {
                    for color in GridColor::all() {
                        ui.selectable_value(&mut self.fields.color, Some(*color), color.name());
                    }
                });
            ui.separator();
            ui.label("Image Size: (width, height)");
            ui.add(egui::TextEdit::singleline(&mut self.fields.resize).desired_width(80.0));
            ui.checkbox(&mut self.fields.show_cell_labels, "Cell numbers");
            ui.separator();
            if ui.button("Commit Changes").clicked() {
                self.commit_options();
            }
            let can_save = self.session.image().is_some() && self.label_prompt.is_none();
            if ui.add_enabled(can_save, egui::Button::new("Save Label")).clicked() {
                self.open_label_prompt();
            }
        });
        ui.label(&self.status);
    }

    fn label_window(&mut self, ctx: &egui::Context) {
        let Some(mut prompt) = self.label_prompt.take() else {
            return;
        };
        let mut open = true;
        let mut submit = false;
        egui::Window::new("Labeler")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Enter roi label:");
                let te = ui.text_edit_singleline(&mut prompt.text);
                if te.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submit = true;
                }
                te.request_focus();
                if ui.button("Save").clicked() {
                    submit = true;
                }
            });

        if submit {
            self.save_label(&prompt);
        } else if open {
            self.label_prompt = Some(prompt);
        }
    }
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for TilesApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_texture(ctx);

        // Keyboard navigation, only while no text field has focus
        if ctx.memory(|m| m.focused().is_none()) {
            let (back, next) = ctx.input(|i| {
                (
                    i.key_pressed(egui::Key::ArrowLeft),
                    i.key_pressed(egui::Key::ArrowRight),
                )
            });
            if back {
                self.navigate(-1);
            }
            if next {
                self.navigate(1);
            }
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));
        egui::TopBottomPanel::bottom("options").show(ctx, |ui| self.option_bar(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
            let canvas_rect = response.rect;

            painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_gray(40));

            if let Some(ref tex) = self.texture {
                let img_rect = egui::Rect::from_min_max(
                    self.image_to_screen(canvas_rect, egui::Pos2::ZERO),
                    self.image_to_screen(canvas_rect, self.image_size().to_pos2()),
                );
                painter.image(
                    tex.id(),
                    img_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
            self.draw_overlay(&painter, canvas_rect);

            self.hover = response
                .hover_pos()
                .map(|pos| self.screen_to_image(canvas_rect, pos))
                .filter(|pos| self.on_image(*pos));

            // Handle pan (middle mouse button)
            if ctx.input(|i| i.pointer.middle_down()) {
                self.pan += ctx.input(|i| i.pointer.delta());
                self.panning = true;
            } else {
                self.panning = false;
            }

            // Handle zoom (scroll wheel)
            let scroll_delta = ctx.input(|i| i.smooth_scroll_delta.y);
            if scroll_delta != 0.0 && response.hovered() {
                let new_zoom = (self.zoom * (1.0 + scroll_delta * 0.002)).clamp(0.1, 10.0);
                if let Some(cursor) = response.hover_pos() {
                    let cursor_rel = cursor - canvas_rect.center() - self.pan;
                    self.pan -= cursor_rel * (new_zoom / self.zoom - 1.0);
                }
                self.zoom = new_zoom;
            }

            if !self.panning && response.clicked_by(egui::PointerButton::Primary) {
                let img_pos = response
                    .interact_pointer_pos()
                    .map(|pos| self.screen_to_image(canvas_rect, pos))
                    .filter(|pos| self.on_image(*pos));
                // Clicks on the background around the image select nothing.
                if let Some(img_pos) = img_pos {
                    let instruction = self
                        .session
                        .on_cell_clicked(img_pos.x as f64, img_pos.y as f64);
                    self.apply(instruction);
                }
            }
        });

        self.label_window(ctx);
    }
}
