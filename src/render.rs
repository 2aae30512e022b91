use std::path::Path;

use ab_glyph::{FontRef, PxScale};
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::assignment::Assignment;
use crate::error::{CrosswordError, CrosswordResult};
use crate::grid_config::Crossword;

/// The character drawn for a blocked cell.
pub const BLOCK: char = '█';

/// Side of one grid cell in a drawn image, in pixels.
pub const CELL_SIZE: u32 = 100;

/// Width of the black border drawn inside each edge of a cell.
pub const CELL_BORDER: u32 = 2;

const LETTER_SCALE: f32 = 80.0;
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

static FONT_DATA: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

/// Lay an assignment out on the grid: each cell holds the letter of whichever assigned word covers
/// it, or `None` if no assigned word does.
pub fn letter_grid(crossword: &Crossword, assignment: &Assignment) -> Vec<Vec<Option<char>>> {
    let mut letters = vec![vec![None; crossword.width]; crossword.height];

    for choice in assignment.choices() {
        let variable = crossword.variable(choice.variable_id);
        let word = crossword.word(choice.word_id);

        for ((row, col), &letter) in variable.cell_coords().into_iter().zip(&word.chars) {
            letters[row][col] = Some(letter);
        }
    }

    letters
}

/// Turn the given puzzle and assignment into a rendered string, with blocks for blocked cells and
/// spaces for open cells that haven't been filled.
pub fn render_grid(crossword: &Crossword, assignment: &Assignment) -> String {
    letter_grid(crossword, assignment)
        .iter()
        .enumerate()
        .map(|(row, letters)| {
            letters
                .iter()
                .enumerate()
                .map(|(col, letter)| {
                    if crossword.is_open(row, col) {
                        letter.unwrap_or(' ')
                    } else {
                        BLOCK
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Draw the grid as an image: black for blocks and cell borders, white open cells, and each
/// assigned letter centered in its cell.
pub fn draw_grid(crossword: &Crossword, assignment: &Assignment) -> CrosswordResult<RgbaImage> {
    let font = FontRef::try_from_slice(FONT_DATA)?;
    let scale = PxScale::from(LETTER_SCALE);
    let interior = CELL_SIZE - 2 * CELL_BORDER;

    let mut image = RgbaImage::from_pixel(
        crossword.width as u32 * CELL_SIZE,
        crossword.height as u32 * CELL_SIZE,
        BLACK,
    );

    for (row, letters) in letter_grid(crossword, assignment).iter().enumerate() {
        for (col, letter) in letters.iter().enumerate() {
            if !crossword.is_open(row, col) {
                continue;
            }

            let left = (col as u32 * CELL_SIZE + CELL_BORDER) as i32;
            let top = (row as u32 * CELL_SIZE + CELL_BORDER) as i32;
            draw_filled_rect_mut(&mut image, Rect::at(left, top).of_size(interior, interior), WHITE);

            if let Some(letter) = letter {
                let text = letter.to_string();
                let (width, height) = text_size(scale, &font, &text);
                let x = left + (interior as i32 - width as i32) / 2;
                let y = top + (interior as i32 - height as i32) / 2;
                draw_text_mut(&mut image, BLACK, x, y, scale, &font, &text);
            }
        }
    }

    Ok(image)
}

/// Draw the grid and save it as a PNG.
pub fn save_image(
    crossword: &Crossword,
    assignment: &Assignment,
    path: &Path,
) -> CrosswordResult {
    draw_grid(crossword, assignment)?
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| CrosswordError::Image {
            path: path.to_path_buf(),
            source,
        })?;

    log::info!("Wrote filled grid to {}", path.display());
    Ok(())
}
