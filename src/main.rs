use anyhow::Result;
use log::info;
use rusted_input::engine::input::{
    BoolAction, ContextId, DeltaAction, DeviceId, InputBuilder, InputConfig, InputSystem,
};
use winit::{
    event::{Event, WindowEvent},
    event_loop::EventLoop,
    window::WindowBuilder,
};

const DEFAULT_BINDINGS: &str = r#"
[settings]
dead_zone = 0.1
stick_delta_scale = 1.0

[bindings.Menu]
"Close Menu" = ["Escape", "Button B"]
"Instant Close Menu" = ["Enter", "Button Start"]
Inventory = ["I"]
Options = ["O"]
Quit = ["Q"]

[bindings.Game]
"Open Menu" = ["Escape", "Button Start"]
"Instant Open Menu" = ["Enter"]
Inventory = ["Tab", "Button Y"]
Jump = ["Space", "Button A"]
Scroll = ["Mouse Wheel"]
"#;

struct Demo {
    input: InputSystem,
    menu: ContextId,
    game: ContextId,
    close_menu: BoolAction,
    instant_close_menu: BoolAction,
    open_menu: BoolAction,
    instant_open_menu: BoolAction,
    inventory: BoolAction,
    options: BoolAction,
    jump: BoolAction,
    quit: BoolAction,
    scroll: DeltaAction,
}

impl Demo {
    fn new(config: &InputConfig) -> Result<Self> {
        let mut builder = InputBuilder::new();
        let inventory = builder.declare_bool("Inventory")?;
        let options = builder.declare_bool("Options")?;
        let close_menu = builder.declare_bool("Close Menu")?;
        let instant_close_menu = builder.declare_bool("Instant Close Menu")?;
        let jump = builder.declare_bool("Jump")?;
        let open_menu = builder.declare_bool("Open Menu")?;
        let instant_open_menu = builder.declare_bool("Instant Open Menu")?;
        let quit = builder.declare_bool("Quit")?;
        let scroll = builder.declare_delta("Scroll")?;

        let menu = builder.declare_context(
            "Menu",
            [
                close_menu.into(),
                instant_close_menu.into(),
                inventory.into(),
                options.into(),
                quit.into(),
            ],
        )?;
        let game = builder.declare_context(
            "Game",
            [
                open_menu.into(),
                instant_open_menu.into(),
                inventory.into(),
                jump.into(),
                scroll.into(),
            ],
        )?;
        builder.apply_config(config)?;

        let mut input = builder.build();
        input.activate(menu, DeviceId::ANY, 0);

        Ok(Self {
            input,
            menu,
            game,
            close_menu,
            instant_close_menu,
            open_menu,
            instant_open_menu,
            inventory,
            options,
            jump,
            quit,
            scroll,
        })
    }

    /// Run one input tick; returns false once Quit is pressed
    fn tick(&mut self) -> bool {
        self.input.begin_tick();
        let any = DeviceId::ANY;

        let watched = [
            ("Inventory", self.inventory),
            ("Options", self.options),
            ("Jump", self.jump),
        ];
        for (name, action) in watched {
            if self.input.just_pressed(action, any) {
                info!("Just pressed: {}", name);
            }
            if self.input.just_released(action, any) {
                info!("Just released: {}", name);
            }
        }

        let scroll = self.input.delta(self.scroll, any);
        if scroll.y != 0.0 {
            info!("Scrolled {:.2} lines", scroll.y);
        }

        // Slow switches wait for the release, instant ones fire on press
        if self.input.just_released(self.close_menu, any)
            || self.input.just_pressed(self.instant_close_menu, any)
        {
            info!("Switching to game");
            self.input.activate(self.game, any, 0);
        } else if self.input.just_released(self.open_menu, any)
            || self.input.just_pressed(self.instant_open_menu, any)
        {
            info!("Switching to menu");
            self.input.activate(self.menu, any, 0);
        }

        !self.input.just_pressed(self.quit, any)
    }
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting input demo...");

    // Bindings from the file given on the command line, or the built-in set
    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading bindings from {}", path);
            InputConfig::load(path)?
        }
        None => InputConfig::from_toml_str(DEFAULT_BINDINGS)?,
    };
    let mut demo = Demo::new(&config)?;

    // Create event loop and window
    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("Rusted Input")
        .with_inner_size(winit::dpi::LogicalSize::new(640, 360))
        .build(&event_loop)?;

    info!("Window created successfully");
    info!("Escape or Enter switches between menu and game, Q quits from the menu");

    // Main event loop
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                info!("Close requested, shutting down...");
                elwt.exit();
            }
            Event::WindowEvent { event, .. } => {
                demo.input.process_window_event(&event);
            }
            Event::DeviceEvent { event, .. } => {
                demo.input.process_device_event(&event);
            }
            Event::AboutToWait => {
                if !demo.tick() {
                    info!("Quit pressed, shutting down...");
                    elwt.exit();
                }
                window.request_redraw();
            }
            _ => {}
        })
        .map_err(|e| anyhow::anyhow!("Event loop error: {}", e))?;

    Ok(())
}
