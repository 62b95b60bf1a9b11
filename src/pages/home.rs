use leptos::prelude::*;

use crate::components::graph_editor::GraphEditor;

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<GraphEditor fullscreen=true />
				<div class="graph-overlay">
					<h1>"Graph Editor"</h1>
					<p class="subtitle">
						"Double-click empty space to add a node, double-click a node then release over another to connect. Shift+click recolors, right-click renames, Delete removes the hovered node, Ctrl+Z undoes."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
