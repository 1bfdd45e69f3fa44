//! Turns a [`Session`] into draw calls on a [`Surface`].
//!
//! Screen positions use the grid convention: `x` grows downward (rows) and
//! `y` grows rightward (columns), both in pixels from the top-left corner.

use crate::sim::camera::{VIEW_COLS, VIEW_ROWS};
use crate::sim::occupant::TILE_PX;
use crate::sim::seeded::terrain_variant;
use crate::sim::{Coords, Direction, Entity, Item, Map, Motion, Occupant, Session, DEFAULT_TERRAIN};

pub const SCREEN_HEIGHT_PX: u32 = VIEW_ROWS as u32 * TILE_PX;
pub const SCREEN_WIDTH_PX: u32 = VIEW_COLS as u32 * TILE_PX;

pub type Rgba = [u8; 4];

pub const WHITE: Rgba = [255, 255, 255, 255];
pub const BLACK: Rgba = [0, 0, 0, 255];
pub const GREY: Rgba = [128, 128, 128, 255];
pub const LIGHT_GREY: Rgba = [211, 211, 211, 255];
pub const RED: Rgba = [255, 0, 0, 255];
pub const DARK_RED: Rgba = [139, 0, 0, 255];

const TILE: i32 = TILE_PX as i32;
const HEART_PX: u32 = 16;
const PANEL_INSET: i32 = 128;
const BLINK_PERIOD: u64 = 128;

pub(crate) const GLYPH_WIDTH: u32 = 3;
pub(crate) const GLYPH_HEIGHT: u32 = 5;

/// One image blit. The surface scales the image to `height` x `width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRequest<'a> {
    pub image_id: &'a str,
    pub dest_x: i32,
    pub dest_y: i32,
    pub height: u32,
    pub width: u32,
}

impl<'a> DrawRequest<'a> {
    pub fn new(image_id: &'a str, dest_x: i32, dest_y: i32, height: u32, width: u32) -> Self {
        Self {
            image_id,
            dest_x,
            dest_y,
            height,
            width,
        }
    }

    pub fn tile(image_id: &'a str, dest_x: i32, dest_y: i32) -> Self {
        Self::new(image_id, dest_x, dest_y, TILE_PX, TILE_PX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Small,
    Medium,
    Large,
}

impl TextSize {
    /// Pixels per font cell.
    pub const fn scale(self) -> u32 {
        match self {
            TextSize::Small => 2,
            TextSize::Medium => 3,
            TextSize::Large => 5,
        }
    }

    pub const fn glyph_height(self) -> u32 {
        GLYPH_HEIGHT * self.scale()
    }

    pub const fn advance(self) -> u32 {
        (GLYPH_WIDTH + 1) * self.scale()
    }

    pub const fn line_height(self) -> u32 {
        (GLYPH_HEIGHT + 2) * self.scale()
    }

    pub fn text_width(self, text: &str) -> u32 {
        let count = text.chars().count() as u32;
        if count == 0 {
            return 0;
        }
        count * self.advance() - self.scale()
    }
}

/// Where the view draws.
pub trait Surface {
    fn draw(&mut self, request: DrawRequest<'_>);

    fn fill_rect(&mut self, x: i32, y: i32, height: u32, width: u32, color: Rgba);

    /// Draws `text` with its top-left corner at (`x`, `y`).
    fn text(&mut self, x: i32, y: i32, size: TextSize, color: Rgba, text: &str);
}

/// Host state the view shows on top of the session.
#[derive(Debug, Clone, Copy)]
pub struct FrameInfo<'a> {
    pub paused: bool,
    pub fps_label: &'a str,
}

pub fn draw_session(surface: &mut dyn Surface, session: &Session, frame: FrameInfo<'_>) {
    if session.is_dead() {
        draw_death(surface);
        return;
    }

    if let Some(map) = session.current_map() {
        draw_map_layers(surface, session, map, Pass::Background);
        draw_map_layers(surface, session, map, Pass::Moving);
    }

    draw_hud(surface, session);
    if session.current_dialog().is_some() {
        draw_dialog(surface, session);
    }
    if session.show_inventory() {
        draw_inventory(surface, session);
    }
    if session.shop().is_some() {
        draw_shop(surface, session);
    }
    if session.show_quests() {
        draw_quests(surface, session);
    }
    if frame.paused {
        draw_pause(surface);
    }
    draw_fps(surface, frame.fps_label);
}

/// Full-screen error shown when the game cannot start.
pub fn draw_error(surface: &mut dyn Surface, message: &str) {
    surface.fill_rect(0, 0, SCREEN_HEIGHT_PX, SCREEN_WIDTH_PX, WHITE);
    let mut top = 8;
    for line in split_for_width(message, SCREEN_WIDTH_PX - 16, TextSize::Medium) {
        surface.text(top, 8, TextSize::Medium, RED, &line);
        top += TextSize::Medium.line_height() as i32;
    }
}

pub fn draw_death(surface: &mut dyn Surface) {
    surface.fill_rect(0, 0, SCREEN_HEIGHT_PX, SCREEN_WIDTH_PX, BLACK);
    draw_centered(surface, SCREEN_HEIGHT_PX as i32 / 2, TextSize::Large, DARK_RED, "YOU DIED");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    /// Terrain and every layer that never slides.
    Background,
    /// Entities and the player, drawn with their motion offsets.
    Moving,
}

fn draw_map_layers(surface: &mut dyn Surface, session: &Session, map: &Map, pass: Pass) {
    let camera = session.camera();
    let origin = camera.view_origin();
    let camera_dx = camera.motion.row_offset.round() as i32;
    let camera_dy = camera.motion.col_offset.round() as i32;

    for row in -1..=VIEW_ROWS {
        for col in -1..=VIEW_COLS {
            let coords = origin.offset(row, col);
            let dx = row * TILE + camera_dx;
            let dy = col * TILE + camera_dy;
            let stack = map.stack(coords).map(Vec::as_slice).unwrap_or(&[]);

            match pass {
                Pass::Background => {
                    let shows_terrain = stack.last().map_or(true, |top| top.transparent);
                    if shows_terrain {
                        let terrain = terrain_id(map.default_square(), session.seed(), coords);
                        surface.draw(DrawRequest::tile(terrain, dx, dy));
                    }
                    for layer in stack.iter().filter(|layer| !layer.is_moving_kind()) {
                        draw_centered_square(surface, &layer.render_id(), dx, dy, layer.height, layer.width);
                    }
                }
                Pass::Moving => {
                    for layer in stack.iter().filter(|layer| layer.is_moving_kind()) {
                        if layer.is_player() {
                            draw_player(surface, session, dx, dy);
                        } else {
                            draw_entity(surface, session, layer, dx, dy);
                        }
                    }
                }
            }
        }
    }
}

fn terrain_id(default_square: &str, seed: u64, coords: Coords) -> &str {
    if default_square == DEFAULT_TERRAIN && terrain_variant(seed, coords, 2) == 1 {
        "grass1"
    } else {
        default_square
    }
}

fn draw_entity(surface: &mut dyn Surface, session: &Session, occupant: &Occupant, dx: i32, dy: i32) {
    let Some(entity) = occupant.entity() else {
        return;
    };
    let (dx, dy) = shifted(entity.motion, dx, dy);
    draw_centered_square(
        surface,
        &occupant.render_id(),
        dx,
        dy,
        occupant.height,
        occupant.width,
    );
    draw_equipment(surface, entity, session.last_direction(), dx, dy, true);
}

fn draw_player(surface: &mut dyn Surface, session: &Session, dx: i32, dy: i32) {
    let player = session.player();
    let (dx, dy) = shifted(player.entity.motion, dx, dy);
    let sprite = player_render_id(session);
    draw_centered_square(surface, &sprite, dx, dy, player.height(), TILE_PX);
    draw_equipment(surface, &player.entity, session.last_direction(), dx, dy, false);
}

/// Player sprite id: rider frames while mounted, then hurt and walk frames,
/// with a `Right` suffix when facing right.
pub fn player_render_id(session: &Session) -> String {
    let player = session.player();
    let tick = session.tick_count();
    let moving = player.entity.is_moving();
    let mut id = String::from("player");

    if let Some(mount) = &player.mount {
        id.push_str(&mount.added_id());
        if moving {
            id.push_str(if tick % 44 < 22 { "1" } else { "2" });
        }
    } else if player.entity.damaged > 0 {
        id.push_str("Damaged");
    } else if moving {
        id.push_str(if tick % 64 < 32 { "1" } else { "2" });
    }

    if session.last_direction() == Direction::Right {
        id.push_str("Right");
    }
    id
}

fn shifted(motion: Motion, dx: i32, dy: i32) -> (i32, i32) {
    (
        dx + motion.row_offset.round() as i32,
        dy + motion.col_offset.round() as i32,
    )
}

fn draw_centered_square(surface: &mut dyn Surface, id: &str, dx: i32, dy: i32, height: u32, width: u32) {
    let dx = dx + centering(height);
    let dy = dy + centering(width);
    surface.draw(DrawRequest::new(id, dx, dy, height, width));
}

fn centering(size: u32) -> i32 {
    ((TILE - size as i32) as f32 / 2.0).round() as i32
}

fn draw_equipment(
    surface: &mut dyn Surface,
    entity: &Entity,
    facing: Direction,
    dx: i32,
    dy: i32,
    show_health: bool,
) {
    if let Some(armor) = &entity.armor {
        surface.draw(DrawRequest::tile(&armor.id, dx, dy));
    }

    if show_health {
        for index in 0..entity.health.max(0) {
            surface.draw(DrawRequest::new(
                "heart",
                dx - HEART_PX as i32,
                dy + index * HEART_PX as i32,
                HEART_PX,
                HEART_PX,
            ));
        }
    }

    if let Some(hand) = &entity.hand {
        draw_weapon(surface, hand, entity.attacking, facing, dx, dy);
    }
}

fn draw_weapon(surface: &mut dyn Surface, hand: &Item, attacking: u32, facing: Direction, dx: i32, dy: i32) {
    let frame = match attacking {
        24.. => Some("1"),
        16..=23 => Some("2"),
        8..=15 => Some("1"),
        _ => None,
    };
    let facing_right = facing == Direction::Right;
    let suffix = if facing_right { "Right" } else { "" };

    let request = match frame {
        Some(frame) => {
            let id = format!("{}{frame}{suffix}", hand.id);
            let dy = if facing_right { dy + 18 } else { dy - 2 };
            (id, dx + 8, dy, 32, 48)
        }
        None => {
            let id = format!("{}{suffix}", hand.id);
            let dy = if facing_right { dy + 18 } else { dy + 14 };
            (id, dx + 8, dy, 32, 32)
        }
    };
    let (id, dx, dy, height, width) = request;
    surface.draw(DrawRequest::new(&id, dx, dy, height, width));
}

fn hand_label(session: &Session) -> String {
    match &session.player().entity.hand {
        Some(hand) => match hand.weapon_damage() {
            Some(damage) if damage != 0 => format!("Hand : {} (dmg: {damage})", hand.name),
            _ => format!("Hand : {}", hand.name),
        },
        None => "Hand : Nothing".to_string(),
    }
}

fn draw_hud(surface: &mut dyn Surface, session: &Session) {
    let player = session.player();
    let boxes = [
        (16, 128, format!("HP : {}", player.entity.health)),
        (160, 264, hand_label(session)),
        (440, 264, format!("Money : {}", player.money)),
    ];
    for (left, width, label) in boxes {
        surface.fill_rect(16, left, 32, width, WHITE);
        surface.text(24, left + 4, TextSize::Medium, BLACK, &label);
    }
}

fn draw_dialog(surface: &mut dyn Surface, session: &Session) {
    let Some(dialog) = session.current_dialog() else {
        return;
    };
    let top = 8 * TILE;
    let width = 10 * TILE_PX;
    let wrap_width = width - 4;

    let mut lines: Vec<(String, Rgba)> = split_for_width(&dialog.text, wrap_width, TextSize::Small)
        .into_iter()
        .map(|line| (line, BLACK))
        .collect();
    for (index, option) in dialog.options.iter().enumerate() {
        let color = if option.available { BLACK } else { GREY };
        let label = format!("{}. {}", index + 1, option.label);
        lines.extend(
            split_for_width(&label, wrap_width, TextSize::Small)
                .into_iter()
                .map(|line| (line, color)),
        );
    }

    let line_height = TextSize::Small.line_height();
    let height = (lines.len() as u32 * line_height + 4).max(TILE_PX);
    surface.fill_rect(top, TILE, height, width, WHITE);
    let mut line_top = top + 2;
    for (line, color) in &lines {
        surface.text(line_top, TILE + 2, TextSize::Small, *color, line);
        line_top += line_height as i32;
    }
}

fn panel_width() -> u32 {
    SCREEN_WIDTH_PX - 2 * PANEL_INSET as u32
}

fn blink_on(session: &Session) -> bool {
    session.tick_count() % BLINK_PERIOD < BLINK_PERIOD / 2
}

fn draw_panel_title(surface: &mut dyn Surface, title: &str) {
    surface.text(PANEL_INSET + 6, PANEL_INSET + 4, TextSize::Medium, BLACK, title);
}

fn draw_item_row<'a>(
    surface: &mut dyn Surface,
    items: impl Iterator<Item = &'a Item>,
    selected_index: usize,
    highlight: bool,
) {
    let row_top = PANEL_INSET + 48;
    for (index, item) in items.enumerate() {
        let left = PANEL_INSET + index as i32 * 32;
        if highlight && index == selected_index {
            surface.fill_rect(row_top, left, item.height, item.width, LIGHT_GREY);
        }
        surface.draw(DrawRequest::new(&item.id, row_top, left, item.height, item.width));
    }
}

fn draw_inventory(surface: &mut dyn Surface, session: &Session) {
    let inventory = &session.player().inventory;
    surface.fill_rect(PANEL_INSET, PANEL_INSET, 256, panel_width(), WHITE);

    let mut title = String::from("Inventory");
    if let Some(selected) = inventory.selected() {
        title.push_str(" - ");
        title.push_str(&selected.name);
        surface.text(PANEL_INSET + 30, PANEL_INSET + 4, TextSize::Small, BLACK, &selected.description);
    }
    draw_panel_title(surface, &title);
    draw_item_row(
        surface,
        inventory.items().iter(),
        inventory.selected_index(),
        blink_on(session),
    );
}

fn draw_shop(surface: &mut dyn Surface, session: &Session) {
    let Some(shop) = session.shop() else {
        return;
    };
    surface.fill_rect(PANEL_INSET, PANEL_INSET, 256, panel_width(), WHITE);

    let mut title = shop.name.clone();
    if let Some(listing) = shop.selected() {
        title.push_str(" - ");
        title.push_str(&listing.item.name);
        let detail = format!("Cost {} - {}", listing.price, listing.item.description);
        surface.text(PANEL_INSET + 30, PANEL_INSET + 4, TextSize::Small, BLACK, &detail);
    }
    draw_panel_title(surface, &title);
    draw_item_row(
        surface,
        shop.listings().iter().map(|listing| &listing.item),
        shop.selected_index(),
        blink_on(session),
    );
}

fn draw_quests(surface: &mut dyn Surface, session: &Session) {
    let quests = session.quests();
    let width = panel_width();
    surface.fill_rect(PANEL_INSET, PANEL_INSET, SCREEN_HEIGHT_PX - 265, width, WHITE);

    let wrap_width = width - 10;
    let small_line = TextSize::Small.line_height() as i32 + 2;
    let mut title = String::from("Quests");
    let mut cursor = 164;
    if let Some(current) = quests.current() {
        title.push_str(" - Current : ");
        title.push_str(&current.name);
        for line in split_for_width(&current.description, wrap_width, TextSize::Small) {
            surface.text(cursor + 4, PANEL_INSET + 10, TextSize::Small, BLACK, &line);
            cursor += small_line;
        }
        cursor += 12;
    }
    draw_panel_title(surface, &title);

    let highlight = blink_on(session);
    for (index, quest) in quests.quests().iter().enumerate() {
        if highlight && index == quests.selected_index() {
            surface.fill_rect(cursor + 5, PANEL_INSET, 24, width, LIGHT_GREY);
        }
        surface.text(cursor + 9, PANEL_INSET + 4, TextSize::Medium, BLACK, &quest.name);
        cursor += 32;
        for line in split_for_width(&quest.description, wrap_width, TextSize::Small) {
            surface.text(cursor + 4, PANEL_INSET + 10, TextSize::Small, BLACK, &line);
            cursor += small_line;
        }
        cursor += 6;
    }
}

fn draw_pause(surface: &mut dyn Surface) {
    draw_centered(surface, SCREEN_HEIGHT_PX as i32 / 2, TextSize::Large, BLACK, "PAUSED");

    let hint = "w - save game, x - load game";
    let hint_width = TextSize::Small.text_width(hint) as i32;
    let screen_height = SCREEN_HEIGHT_PX as i32;
    let screen_width = SCREEN_WIDTH_PX as i32;
    surface.fill_rect(
        screen_height - 34,
        screen_width - hint_width - 20,
        34,
        hint_width as u32 + 20,
        WHITE,
    );
    surface.text(
        screen_height - 22,
        screen_width - hint_width - 10,
        TextSize::Small,
        BLACK,
        hint,
    );
}

fn draw_fps(surface: &mut dyn Surface, label: &str) {
    surface.text(4, 2, TextSize::Small, BLACK, label);
}

fn draw_centered(surface: &mut dyn Surface, middle_x: i32, size: TextSize, color: Rgba, text: &str) {
    let width = size.text_width(text) as i32;
    let top = middle_x - size.glyph_height() as i32 / 2;
    surface.text(top, (SCREEN_WIDTH_PX as i32 - width) / 2, size, color, text);
}

/// Greedy word wrap into lines no wider than `max_width` pixels. Words longer
/// than a line are split by character.
pub fn split_for_width(text: &str, max_width: u32, size: TextSize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if size.text_width(&candidate) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for ch in word.chars() {
            current.push(ch);
            if size.text_width(&current) > max_width && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(ch);
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
