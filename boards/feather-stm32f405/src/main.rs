#![deny(unsafe_code)]
#![no_main]
#![no_std]

//! NebuleAir air-quality node on the Adafruit Feather STM32F405
//!
//! - NextPM particulate sensor on USART3 (PB11 RX, PB10 TX), 115200 8E1
//! - BME280 on I2C1 (PB6 SCL, PB7 SDA)
//! - W5500 Ethernet wing on SPI2, DHCP, line protocol over UDP
//! - Network LED on PC1, sensor LED on PB8

use defmt_rtt as _; // global logger
use panic_probe as _;
use rtic::app;
use rtic_monotonics::stm32::prelude::*;

mod board;
mod eth;
mod network;

stm32_tim2_monotonic!(Mono, 1_000_000);

#[app(device = embassy_stm32, peripherals = true, dispatchers = [UART4, UART5])]
mod app {
    use super::*;
    use defmt::{error, info, warn};
    use embassy_futures::join::join3;
    use embassy_stm32::exti::ExtiInput;
    use embassy_stm32::gpio::{Level, Output, Pull, Speed};
    use embassy_stm32::i2c::{self, I2c};
    use embassy_stm32::peripherals;
    use embassy_stm32::rcc::{Hse, HseMode};
    use embassy_stm32::spi::{self, Spi};
    use embassy_stm32::time::Hertz;
    use embassy_stm32::usart::{self, BufferedUart, DataBits, Parity, StopBits};
    use embassy_time::Delay;
    use nebuleair_core::sensors::{ParticulateFrameDecoder, ParticulateSampler};
    use nebuleair_core::{Control, Node, NodeConfig, NodeParts};
    use static_cell::StaticCell;

    use board::{Bme280Sensor, EmbassyClock, NextPmPort, StatusLeds};
    use network::{EthLink, NetworkConfig, UdpSink};

    type SpiPeripheral = embassy_stm32::Peri<'static, peripherals::SPI2>;
    type PinPB13 = embassy_stm32::Peri<'static, peripherals::PB13>;
    type PinPB15 = embassy_stm32::Peri<'static, peripherals::PB15>;
    type PinPB14 = embassy_stm32::Peri<'static, peripherals::PB14>;
    type PinPC6 = embassy_stm32::Peri<'static, peripherals::PC6>;
    type PinPC3 = embassy_stm32::Peri<'static, peripherals::PC3>;
    type PinPC2 = embassy_stm32::Peri<'static, peripherals::PC2>;
    type ExtiChannel = embassy_stm32::Peri<'static, peripherals::EXTI2>;
    type DmaTx = embassy_stm32::Peri<'static, peripherals::DMA1_CH4>;
    type DmaRx = embassy_stm32::Peri<'static, peripherals::DMA1_CH3>;

    type NextPmSampler = ParticulateSampler<NextPmPort, EmbassyClock, Delay>;
    type BoardNode =
        Node<EmbassyClock, Delay, EthLink, Bme280Sensor, StatusLeds, UdpSink, NextPmSampler>;

    /// How long boot waits for the first DHCP lease before handing the
    /// link over to the connectivity monitor
    const FIRST_LINK_TIMEOUT_MS: u64 = 30_000;

    /// Pause between two node iterations
    const LOOP_YIELD_MS: u64 = 50;

    struct NetworkPeripherals {
        spi: SpiPeripheral,
        sck: PinPB13,
        mosi: PinPB15,
        miso: PinPB14,
        cs: PinPC6,
        reset: PinPC3,
        int: PinPC2,
        exti: ExtiChannel,
        dma_tx: DmaTx,
        dma_rx: DmaRx,
    }

    embassy_stm32::bind_interrupts!(struct UartIrqs {
        USART3 => usart::BufferedInterruptHandler<peripherals::USART3>;
    });

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        node: BoardNode,
        warmup_ms: u64,
    }

    #[init]
    fn init(_cx: init::Context) -> (Shared, Local) {
        info!("NebuleAir node starting...");

        // Adafruit Feather STM32F405: 12 MHz HSE
        let mut config = embassy_stm32::Config::default();
        config.rcc.hse = Some(Hse {
            freq: Hertz(12_000_000),
            mode: HseMode::Oscillator,
        });

        // HSE (12 MHz) / PREDIV(6) = 2 MHz (PLL input)
        // 2 MHz * MUL(168) = 336 MHz (VCO)
        // VCO / DIVP(4) = 84 MHz (SYSCLK)
        config.rcc.pll_src = embassy_stm32::rcc::PllSource::HSE;
        config.rcc.pll = Some(embassy_stm32::rcc::Pll {
            prediv: embassy_stm32::rcc::PllPreDiv::DIV6,
            mul: embassy_stm32::rcc::PllMul::MUL168,
            divp: Some(embassy_stm32::rcc::PllPDiv::DIV4),
            divq: None,
            divr: None,
        });
        config.rcc.sys = embassy_stm32::rcc::Sysclk::PLL1_P;
        config.rcc.ahb_pre = embassy_stm32::rcc::AHBPrescaler::DIV1; // 84 MHz
        config.rcc.apb1_pre = embassy_stm32::rcc::APBPrescaler::DIV2; // 42 MHz
        config.rcc.apb2_pre = embassy_stm32::rcc::APBPrescaler::DIV1; // 84 MHz

        let p = embassy_stm32::init(config);
        info!("System initialized: SYSCLK=84MHz");

        // TIM2 on APB1: timer clock = 2*APB1 when prescaler != 1
        let timer_clock_hz = 84_000_000;
        Mono::start(timer_clock_hz);

        let node_config = NodeConfig::default();

        // NextPM: 115200 baud, 8 data bits, even parity, 1 stop bit
        let mut uart_config = usart::Config::default();
        uart_config.baudrate = 115_200;
        uart_config.data_bits = DataBits::DataBits8;
        uart_config.parity = Parity::ParityEven;
        uart_config.stop_bits = StopBits::STOP1;

        static UART_TX_BUF: StaticCell<[u8; 32]> = StaticCell::new();
        static UART_RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
        let uart = defmt::unwrap!(BufferedUart::new(
            p.USART3,
            p.PB11,
            p.PB10,
            UART_TX_BUF.init([0; 32]),
            UART_RX_BUF.init([0; 256]),
            UartIrqs,
            uart_config,
        ));
        info!("NextPM UART ready");

        let decoder = ParticulateFrameDecoder::with_config(
            NextPmPort(uart),
            EmbassyClock,
            Delay,
            node_config.decoder,
        );
        let sampler = ParticulateSampler::new(decoder, node_config.sampler);

        let mut i2c_config = i2c::Config::default();
        i2c_config.frequency = Hertz(100_000);
        let i2c = I2c::new_blocking(p.I2C1, p.PB6, p.PB7, i2c_config);
        let environment = Bme280Sensor::new(i2c);

        let leds = StatusLeds::new(
            Output::new(p.PC1, Level::Low, Speed::Low),
            Output::new(p.PB8, Level::Low, Speed::Low),
        );

        let parts = NodeParts {
            clock: EmbassyClock,
            delay: Delay,
            link: EthLink,
            environment,
            indicator: leds,
            sink: UdpSink,
        };
        let node = Node::new(parts, sampler, &node_config);

        let net_periph = NetworkPeripherals {
            spi: p.SPI2,
            sck: p.PB13,
            mosi: p.PB15,
            miso: p.PB14,
            cs: p.PC6,
            reset: p.PC3,
            int: p.PC2,
            exti: p.EXTI2,
            dma_tx: p.DMA1_CH4,
            dma_rx: p.DMA1_CH3,
        };

        network_task::spawn(net_periph).ok();
        node_task::spawn().ok();

        (
            Shared {},
            Local {
                node,
                warmup_ms: node_config.sensor_warmup.to_millis(),
            },
        )
    }

    /// Sampling, upload and connectivity supervision
    ///
    /// Blocking sensor exchanges happen here; the network task runs at a
    /// higher priority and preempts them.
    #[task(priority = 1, local = [node, warmup_ms])]
    async fn node_task(cx: node_task::Context) {
        let node = cx.local.node;

        info!("Waiting for network...");
        let mut waited: u64 = 0;
        while !network::is_link_up() && waited < FIRST_LINK_TIMEOUT_MS {
            Mono::delay(100.millis()).await;
            waited += 100;
        }
        if network::is_link_up() {
            node.announce_online();
        } else {
            warn!("No network after {} ms, continuing offline", FIRST_LINK_TIMEOUT_MS);
        }

        let warmup_ms = *cx.local.warmup_ms;
        info!("NextPM warm-up, {} ms", warmup_ms);
        Mono::delay(warmup_ms.millis()).await;

        info!("Entering main loop");
        loop {
            if let Control::Restart(reason) = node.poll() {
                error!("Restart requested: {}", reason);
                Mono::delay(100.millis()).await;
                cortex_m::peripheral::SCB::sys_reset();
            }
            Mono::delay(LOOP_YIELD_MS.millis()).await;
        }
    }

    /// Network task - owns the W5500 driver and the embassy-net stack
    ///
    /// Stack is !Send and must remain within this task.
    #[task(priority = 2)]
    async fn network_task(_cx: network_task::Context, periph: NetworkPeripherals) {
        use embassy_net::{Config, StackResources};

        info!("Network task started");

        let mut spi_config = spi::Config::default();
        spi_config.frequency = Hertz(10_000_000); // 10 MHz for W5500

        let spi = Spi::new(
            periph.spi,
            periph.sck,
            periph.mosi,
            periph.miso,
            periph.dma_tx,
            periph.dma_rx,
            spi_config,
        );

        let cs = Output::new(periph.cs, Level::High, Speed::VeryHigh);
        let reset = Output::new(periph.reset, Level::High, Speed::Low);
        let int = ExtiInput::new(periph.int, periph.exti, Pull::Up);

        let eth_periph = eth::EthPeripherals {
            spi,
            cs,
            reset,
            int,
        };

        let net_config = NetworkConfig::default();
        let Some((device, w5500_runner)) = eth::init_w5500(eth_periph, net_config.mac_addr).await
        else {
            // Link flag stays down; the connectivity monitor escalates
            return;
        };

        static RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
        let (stack, mut net_runner) = embassy_net::new(
            device,
            Config::dhcpv4(Default::default()),
            RESOURCES.init(StackResources::new()),
            net_config.seed,
        );
        info!("Network stack initialized with DHCP");

        join3(
            w5500_runner.run(),
            net_runner.run(),
            network::run_commands(&stack, &net_config),
        )
        .await;
    }

    /// RTIC idle task - WFI sleep mode when no tasks active
    #[idle]
    fn idle(_cx: idle::Context) -> ! {
        loop {
            cortex_m::asm::wfi();
        }
    }
}
