use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{error, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, FileReader, HtmlAnchorElement, HtmlCanvasElement, HtmlInputElement,
	KeyboardEvent, MouseEvent, TouchEvent, Window,
};

use super::config::EditorConfig;
use super::document::Graph3d;
use super::error::EditorError;
use super::render;
use super::state::{EditorState, KeyInput, Prompter};
use super::storage::{
	BrowserStore, list_sessions, load_document, new_session_key, normalize_session_key,
	save_document, session_key_from_query, session_query,
};

type SharedState = Rc<RefCell<Option<EditorState>>>;
type SharedCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// `window.prompt`.
struct BrowserPrompt;

impl Prompter for BrowserPrompt {
	fn prompt(&mut self, message: &str, default: &str) -> Option<String> {
		web_sys::window()?
			.prompt_with_message_and_default(message, default)
			.ok()
			.flatten()
	}
}

fn viewport(window: &Window) -> (f64, f64) {
	let width = window.inner_width().ok().and_then(|w| w.as_f64());
	let height = window.inner_height().ok().and_then(|h| h.as_f64());
	(width.unwrap_or(800.0), height.unwrap_or(600.0))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, EditorError> {
	canvas
		.get_context("2d")?
		.ok_or_else(|| EditorError::Dom("2d context unavailable".into()))?
		.dyn_into::<CanvasRenderingContext2d>()
		.map_err(|_| EditorError::Dom("context is not 2d".into()))
}

/// Client coordinates to canvas coordinates.
fn canvas_point(
	canvas_ref: NodeRef<leptos::html::Canvas>,
	client_x: i32,
	client_y: i32,
) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((client_x as f64 - rect.left(), client_y as f64 - rect.top()))
}

fn with_state(state: &SharedState, f: impl FnOnce(&mut EditorState)) {
	if let Some(ref mut s) = *state.borrow_mut() {
		f(s);
	}
}

/// Saves `json` through a temporary data-URL link.
fn download(file_name: &str, json: &str) -> Result<(), EditorError> {
	let document = web_sys::window()
		.and_then(|window| window.document())
		.ok_or_else(|| EditorError::Dom("no document".into()))?;
	let link: HtmlAnchorElement = document
		.create_element("a")?
		.dyn_into()
		.map_err(|_| EditorError::Dom("anchor element expected".into()))?;
	let encoded = String::from(js_sys::encode_uri_component(json));
	link.set_href(&format!("data:application/json;charset=utf-8,{encoded}"));
	link.set_download(file_name);
	link.click();
	Ok(())
}

fn open_session(key: &str) {
	let Some(window) = web_sys::window() else {
		return;
	};
	if let Err(err) = window.location().set_search(&session_query(key)) {
		error!("cannot open session {key}: {err:?}");
	}
}

#[component]
pub fn GraphEditor(#[prop(default = true)] fullscreen: bool) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: SharedCallback = Rc::new(RefCell::new(None));
	let resize_cb: SharedCallback = Rc::new(RefCell::new(None));
	let autosave_cb: SharedCallback = Rc::new(RefCell::new(None));
	let keydown_cb: Rc<RefCell<Option<Closure<dyn FnMut(KeyboardEvent)>>>> =
		Rc::new(RefCell::new(None));

	let notice = RwSignal::new(None::<String>);
	let sessions = RwSignal::new(Vec::<String>::new());
	let import_pending = RwSignal::new(false);

	let search = web_sys::window()
		.and_then(|window| window.location().search().ok())
		.unwrap_or_default();
	let config = EditorConfig::from_query(&search);
	let session_key = session_key_from_query(&search).unwrap_or_else(new_session_key);
	info!("session {session_key}");

	let store: Rc<RefCell<Option<BrowserStore>>> = Rc::new(RefCell::new(
		BrowserStore::local()
			.inspect_err(|err| warn!("sessions will not be saved: {err}"))
			.ok(),
	));

	let (state_init, store_init, key_init) = (state.clone(), store.clone(), session_key.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			error!("no window, editor not started");
			return;
		};

		let (w, h) = if fullscreen {
			viewport(&window)
		} else {
			canvas
				.parent_element()
				.map(|p| (p.client_width() as f64, p.client_height() as f64))
				.unwrap_or((800.0, 600.0))
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx = match context_2d(&canvas) {
			Ok(ctx) => ctx,
			Err(err) => {
				error!("editor not started: {err}");
				return;
			}
		};

		let mut editor = EditorState::new(config.clone(), w, h);
		if let Some(ref store) = *store_init.borrow() {
			match load_document(store, &key_init) {
				Ok(Some(document)) => notice.set(editor.load_document(document).notice()),
				Ok(None) => info!("new session {key_init}"),
				Err(err) => {
					error!("cannot restore {key_init}: {err}");
					notice.set(Some("The saved graph could not be read; starting empty.".into()));
				}
			}
			match list_sessions(store) {
				Ok(keys) => sessions.set(keys),
				Err(err) => warn!("cannot list sessions: {err}"),
			}
		}
		*state_init.borrow_mut() = Some(editor);

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = viewport(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				with_state(&state_resize, |s| s.resize(nw, nh));
			}));
			if let Some(ref cb) = *resize_cb.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let state_key = state_init.clone();
		*keydown_cb.borrow_mut() = Some(Closure::new(move |ev: KeyboardEvent| {
			let key = KeyInput {
				key: ev.key(),
				ctrl: ev.ctrl_key() || ev.meta_key(),
				shift: ev.shift_key(),
			};
			with_state(&state_key, |s| {
				if s.handle_key(&key, &mut BrowserPrompt) {
					ev.prevent_default();
				}
			});
		}));
		if let Some(ref cb) = *keydown_cb.borrow() {
			let _ = window.add_event_listener_with_callback("keydown", cb.as_ref().unchecked_ref());
		}

		let (state_save, store_save, key_save) =
			(state_init.clone(), store_init.clone(), key_init.clone());
		*autosave_cb.borrow_mut() = Some(Closure::new(move || {
			let Some(document) = state_save.borrow().as_ref().map(EditorState::to_document) else {
				return;
			};
			if let Some(ref mut store) = *store_save.borrow_mut() {
				if let Err(err) = save_document(store, &key_save, &document) {
					warn!("autosave failed: {err}");
				}
			}
		}));
		if let Some(ref cb) = *autosave_cb.borrow() {
			let _ = window.set_interval_with_callback_and_timeout_and_arguments_0(
				cb.as_ref().unchecked_ref(),
				config.save_interval_ms,
			);
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate.clone());
		*animate.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				render::measure(s, &ctx);
				if s.animation_running {
					s.tick(0.016);
				}
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		with_state(&state_md, |s| s.press(x, y));
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		with_state(&state_mm, |s| s.move_to(x, y));
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		with_state(&state_mu, |s| s.release(x, y));
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		with_state(&state_ml, EditorState::leave);
	};

	let state_dc = state.clone();
	let on_dblclick = move |ev: MouseEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		with_state(&state_dc, |s| s.double_click(x, y, &mut BrowserPrompt));
	};

	let state_cl = state.clone();
	let on_click = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		with_state(&state_cl, |s| s.click(x, y, ev.shift_key(), &mut BrowserPrompt));
	};

	let state_cm = state.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		with_state(&state_cm, |s| s.context_menu(x, y, &mut BrowserPrompt));
	};

	let state_ts = state.clone();
	let on_touchstart = move |ev: TouchEvent| {
		let touches = ev.touches();
		if touches.length() > 1 {
			return;
		}
		let Some(touch) = touches.get(0) else {
			return;
		};
		let Some((x, y)) = canvas_point(canvas_ref, touch.client_x(), touch.client_y()) else {
			return;
		};
		let now = js_sys::Date::now();
		with_state(&state_ts, |s| s.touch_start(x, y, now, &mut BrowserPrompt));
	};

	let state_tm = state.clone();
	let on_touchmove = move |ev: TouchEvent| {
		let Some(touch) = ev.touches().get(0) else {
			return;
		};
		let Some((x, y)) = canvas_point(canvas_ref, touch.client_x(), touch.client_y()) else {
			return;
		};
		with_state(&state_tm, |s| s.touch_move(x, y));
	};

	let state_te = state.clone();
	let on_touchend = move |_: TouchEvent| {
		with_state(&state_te, EditorState::touch_end);
	};

	let state_rn = state.clone();
	let on_random = move |_: MouseEvent| {
		let (rx, ry) = (js_sys::Math::random(), js_sys::Math::random());
		with_state(&state_rn, |s| {
			let (x, y) = (rx * s.width, ry * s.height);
			s.place_node("Random", x, y);
		});
	};

	let state_rs = state.clone();
	let on_reset = move |_: MouseEvent| {
		let confirmed = web_sys::window()
			.and_then(|w| {
				w.confirm_with_message("Do you really want to reset the canvas?")
					.ok()
			})
			.unwrap_or(false);
		if confirmed {
			with_state(&state_rs, EditorState::reset);
		}
	};

	let state_pause = state.clone();
	let on_pause = move |_: MouseEvent| {
		with_state(&state_pause, |s| s.animation_running = !s.animation_running);
	};

	let (state_sa, store_sa) = (state.clone(), store.clone());
	let on_save_as = move |_: MouseEvent| {
		let Some(name) = BrowserPrompt.prompt("Save session as:", "") else {
			return;
		};
		if name.trim().is_empty() {
			return;
		}
		let key = normalize_session_key(&name);
		let Some(document) = state_sa.borrow().as_ref().map(EditorState::to_document) else {
			return;
		};
		let saved = match *store_sa.borrow_mut() {
			Some(ref mut store) => save_document(store, &key, &document),
			None => Err(EditorError::Storage("local storage unavailable".into())),
		};
		match saved {
			Ok(()) => {
				info!("saved session {key}");
				open_session(&key);
			}
			Err(err) => {
				error!("cannot save {key}: {err}");
				notice.set(Some(format!("Could not save session: {err}")));
			}
		}
	};

	let on_session_pick = move |ev: leptos::ev::Event| {
		let key = event_target_value(&ev);
		if !key.is_empty() {
			open_session(&key);
		}
	};

	let state_ex = state.clone();
	let on_export = move |_: MouseEvent| {
		let Some(document) = state_ex.borrow().as_ref().map(EditorState::to_document) else {
			return;
		};
		if let Err(err) = document.to_json().and_then(|json| download("graph.json", &json)) {
			error!("export failed: {err}");
		}
	};

	let state_ex3 = state.clone();
	let on_export_3d = move |_: MouseEvent| {
		let Some(document) = state_ex3.borrow().as_ref().map(EditorState::to_document) else {
			return;
		};
		let exported = Graph3d::from_document(&document)
			.to_json()
			.and_then(|json| download("graph3d.json", &json));
		if let Err(err) = exported {
			error!("3-D export failed: {err}");
		}
	};

	let state_im = state.clone();
	let on_import = move |ev: leptos::ev::Event| {
		let input: HtmlInputElement = event_target(&ev);
		let Some(file) = input.files().and_then(|files| files.get(0)) else {
			return;
		};
		let reader = match FileReader::new() {
			Ok(reader) => reader,
			Err(err) => {
				error!("cannot read file: {err:?}");
				return;
			}
		};

		import_pending.set(true);
		let finish = {
			let (state, input) = (state_im.clone(), input.clone());
			move |read: Result<String, String>| {
				import_pending.set(false);
				input.set_value("");
				with_state(&state, |s| notice.set(s.import(read)));
			}
		};
		let (finish_error, finish_sync) = (finish.clone(), finish.clone());

		let reader_load = reader.clone();
		let onload = Closure::once_into_js(move || {
			let text = reader_load
				.result()
				.ok()
				.and_then(|result| result.as_string())
				.ok_or_else(|| "file is not text".to_owned());
			finish(text);
		});
		let reader_error = reader.clone();
		let onerror = Closure::once_into_js(move || {
			let reason = reader_error
				.error()
				.map_or_else(|| "read was interrupted".to_owned(), |err| err.message());
			finish_error(Err(reason));
		});
		reader.set_onload(Some(onload.unchecked_ref()));
		reader.set_onerror(Some(onerror.unchecked_ref()));
		reader.set_onabort(Some(onerror.unchecked_ref()));
		if let Err(err) = reader.read_as_text(&file) {
			finish_sync(Err(format!("{err:?}")));
		}
	};

	view! {
		<div class="graph-editor">
			<canvas
				node_ref=canvas_ref
				class="graph-editor-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:dblclick=on_dblclick
				on:click=on_click
				on:contextmenu=on_contextmenu
				on:touchstart=on_touchstart
				on:touchmove=on_touchmove
				on:touchend=on_touchend
				style="display: block;"
			/>
			<div class="graph-toolbar">
				<button on:click=on_random>"Random node"</button>
				<button on:click=on_reset>"Reset"</button>
				<button on:click=on_pause>"Pause / resume"</button>
				<button on:click=on_save_as>"Save as…"</button>
				<select on:change=on_session_pick>
					<option value="">"Open session…"</option>
					{move || {
						sessions
							.get()
							.into_iter()
							.map(|key| view! { <option value=key.clone()>{key.clone()}</option> })
							.collect_view()
					}}
				</select>
				<button on:click=on_export>"Export JSON"</button>
				<button on:click=on_export_3d>"Export 3D"</button>
				<label>
					"Import "
					<input
						type="file"
						accept="application/json"
						prop:disabled=move || import_pending.get()
						on:change=on_import
					/>
				</label>
			</div>
			{move || {
				notice
					.get()
					.map(|text| {
						view! {
							<div class="graph-notice" on:click=move |_| notice.set(None)>
								{text}
							</div>
						}
					})
			}}
		</div>
	}
}
